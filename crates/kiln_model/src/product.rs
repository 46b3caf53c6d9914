//! Platforms and product kinds a target can build.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The operating system family a target is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// iPhone and iPad.
    #[serde(rename = "iOS")]
    Ios,
    /// Desktop.
    #[serde(rename = "macOS")]
    MacOs,
    /// Television set-top boxes.
    #[serde(rename = "tvOS")]
    TvOs,
    /// Wrist devices.
    #[serde(rename = "watchOS")]
    WatchOs,
    /// Spatial computing headsets.
    #[serde(rename = "visionOS")]
    VisionOs,
}

impl Platform {
    /// Returns the canonical platform name used in hashes and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::MacOs => "macOS",
            Platform::TvOs => "tvOS",
            Platform::WatchOs => "watchOS",
            Platform::VisionOs => "visionOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of artifact a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Product {
    /// An application bundle.
    App,
    /// A static archive (`lib<name>.a`).
    StaticLibrary,
    /// A dynamic library (`lib<name>.dylib`).
    DynamicLibrary,
    /// A dynamic framework bundle.
    Framework,
    /// A framework bundle wrapping a static archive.
    StaticFramework,
    /// A unit test bundle.
    UnitTests,
    /// A UI test bundle.
    UiTests,
    /// A resource bundle.
    Bundle,
    /// A command-line executable.
    CommandLineTool,
    /// An application extension.
    AppExtension,
    /// A watch application.
    Watch2App,
    /// A watch extension.
    Watch2Extension,
    /// A messages extension.
    MessagesExtension,
    /// A sticker pack extension.
    StickerPackExtension,
    /// An app clip.
    AppClip,
    /// An XPC service.
    Xpc,
}

impl Product {
    /// Returns `true` for products that are archived into their dependents at link time.
    pub fn is_static(self) -> bool {
        matches!(self, Product::StaticLibrary | Product::StaticFramework)
    }

    /// Returns `true` for library and framework products other targets can link.
    pub fn is_linkable(self) -> bool {
        matches!(
            self,
            Product::StaticLibrary
                | Product::DynamicLibrary
                | Product::Framework
                | Product::StaticFramework
        )
    }

    /// Returns `true` for products whose link step absorbs static dependencies.
    ///
    /// Static libraries themselves never do: their static dependencies are
    /// linked by whatever final product links them.
    pub fn can_link_static_products(self) -> bool {
        matches!(
            self,
            Product::Framework
                | Product::App
                | Product::CommandLineTool
                | Product::Xpc
                | Product::UnitTests
                | Product::UiTests
                | Product::AppExtension
                | Product::Watch2Extension
                | Product::MessagesExtension
                | Product::AppClip
        )
    }

    /// Returns `true` for products that carry dynamic frameworks in their bundle.
    pub fn can_embed_products(self) -> bool {
        matches!(self, Product::App | Product::UnitTests | Product::UiTests)
    }

    /// Returns `true` for unit and UI test bundles.
    pub fn is_tests_bundle(self) -> bool {
        matches!(self, Product::UnitTests | Product::UiTests)
    }

    /// Returns `true` for products hosted inside an application.
    pub fn is_extension(self) -> bool {
        matches!(
            self,
            Product::AppExtension
                | Product::StickerPackExtension
                | Product::MessagesExtension
                | Product::Watch2Extension
        )
    }

    /// File extension of the built product, if it has one.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Product::App | Product::Watch2App | Product::AppClip => Some("app"),
            Product::StaticLibrary => Some("a"),
            Product::DynamicLibrary => Some("dylib"),
            Product::Framework | Product::StaticFramework => Some("framework"),
            Product::UnitTests | Product::UiTests => Some("xctest"),
            Product::Bundle => Some("bundle"),
            Product::AppExtension
            | Product::Watch2Extension
            | Product::MessagesExtension
            | Product::StickerPackExtension => Some("appex"),
            Product::Xpc => Some("xpc"),
            Product::CommandLineTool => None,
        }
    }

    /// Stable identifier used in hashes and the JSON export.
    pub fn as_str(self) -> &'static str {
        match self {
            Product::App => "app",
            Product::StaticLibrary => "staticLibrary",
            Product::DynamicLibrary => "dynamicLibrary",
            Product::Framework => "framework",
            Product::StaticFramework => "staticFramework",
            Product::UnitTests => "unitTests",
            Product::UiTests => "uiTests",
            Product::Bundle => "bundle",
            Product::CommandLineTool => "commandLineTool",
            Product::AppExtension => "appExtension",
            Product::Watch2App => "watch2App",
            Product::Watch2Extension => "watch2Extension",
            Product::MessagesExtension => "messagesExtension",
            Product::StickerPackExtension => "stickerPackExtension",
            Product::AppClip => "appClip",
            Product::Xpc => "xpc",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
