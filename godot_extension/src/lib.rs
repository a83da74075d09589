//! Godot GDExtension for navigation trials
//!
//! `NavigationBridge` 를 Godot 에 등록한다.

use godot::prelude::*;

mod navigation_bridge;

pub use navigation_bridge::NavigationBridge;

struct NavigationRustExtension;

#[gdextension]
unsafe impl ExtensionLibrary for NavigationRustExtension {}
