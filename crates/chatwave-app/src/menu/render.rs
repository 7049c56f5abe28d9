//! Render a `MenuTree` into native muda menus

use super::{MenuCommand, MenuNode, MenuTree, NativeItem};
use chatwave_core::config::{APP_NAME, WEBSITE_URL};
use chatwave_core::{ChatwaveError, ChatwaveResult};
use muda::accelerator::Accelerator;
use muda::{AboutMetadata, CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Owns the menu bar and maps native item ids back to commands
pub struct MenuRenderer {
    menu: Menu,
    tree: Option<MenuTree>,
    commands: HashMap<MenuId, MenuCommand>,
    checks: Vec<CheckMenuItem>,
    next_id: u64,
}

impl MenuRenderer {
    pub fn new() -> Self {
        Self {
            menu: Menu::new(),
            tree: None,
            commands: HashMap::new(),
            checks: Vec::new(),
            next_id: 0,
        }
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn command(&self, id: &MenuId) -> Option<MenuCommand> {
        self.commands.get(id).copied()
    }

    /// Bring the native menu in line with `tree`
    ///
    /// A tree with the same structure only updates check marks, which also undoes any toggle
    /// the OS applied on click before the command was confirmed.
    pub fn render(&mut self, tree: MenuTree) -> ChatwaveResult<()> {
        match &self.tree {
            Some(current) if current.same_structure(&tree) => self.sync_checks(&tree),
            _ => self.rebuild(&tree)?,
        }
        self.tree = Some(tree);
        Ok(())
    }

    fn sync_checks(&self, tree: &MenuTree) {
        let states = tree.leaves().into_iter().filter_map(|node| match node {
            MenuNode::Check { checked, .. } => Some(*checked),
            _ => None,
        });

        for (item, checked) in self.checks.iter().zip(states) {
            if item.is_checked() != checked {
                item.set_checked(checked);
            }
        }
    }

    fn rebuild(&mut self, tree: &MenuTree) -> ChatwaveResult<()> {
        debug!("Rebuilding application menu");
        while self.menu.remove_at(0).is_some() {}
        self.commands.clear();
        self.checks.clear();

        for node in &tree.menus {
            match node {
                MenuNode::Submenu {
                    label,
                    enabled,
                    children,
                } => {
                    let submenu = self.build_submenu(label, *enabled, children)?;
                    #[cfg(target_os = "macos")]
                    match label.as_str() {
                        "Window" => submenu.set_as_windows_menu_for_nsapp(),
                        "Help" => submenu.set_as_help_menu_for_nsapp(),
                        _ => {}
                    }
                    self.menu.append(&submenu).map_err(menu_error)?;
                }
                other => warn!("Ignoring top-level menu node {:?}", other),
            }
        }
        Ok(())
    }

    fn build_submenu(&mut self, label: &str, enabled: bool, children: &[MenuNode]) -> ChatwaveResult<Submenu> {
        let submenu = Submenu::new(label, enabled);
        for child in children {
            self.append(&submenu, child)?;
        }
        Ok(submenu)
    }

    fn append(&mut self, parent: &Submenu, node: &MenuNode) -> ChatwaveResult<()> {
        let result = match node {
            MenuNode::Submenu {
                label,
                enabled,
                children,
            } => {
                let submenu = self.build_submenu(label, *enabled, children)?;
                parent.append(&submenu)
            }
            MenuNode::Item {
                label,
                accelerator,
                enabled,
                command,
            } => {
                let id = self.register(*command);
                let item = MenuItem::with_id(id, label, *enabled, parse_accelerator(*accelerator));
                parent.append(&item)
            }
            MenuNode::Check {
                label,
                accelerator,
                enabled,
                checked,
                command,
            } => {
                let id = self.register(*command);
                let item =
                    CheckMenuItem::with_id(id, label, *enabled, *checked, parse_accelerator(*accelerator));
                let appended = parent.append(&item);
                self.checks.push(item);
                appended
            }
            MenuNode::Separator => parent.append(&PredefinedMenuItem::separator()),
            MenuNode::Native(native) => parent.append(&native_item(*native)),
        };
        result.map_err(menu_error)
    }

    fn register(&mut self, command: MenuCommand) -> MenuId {
        self.next_id += 1;
        let id = MenuId::new(format!("chatwave-{}", self.next_id));
        self.commands.insert(id.clone(), command);
        id
    }
}

impl Default for MenuRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_accelerator(accelerator: Option<&str>) -> Option<Accelerator> {
    let accelerator = accelerator?;
    match accelerator.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Invalid accelerator {:?}: {}", accelerator, e);
            None
        }
    }
}

fn native_item(item: NativeItem) -> PredefinedMenuItem {
    match item {
        NativeItem::Undo => PredefinedMenuItem::undo(None),
        NativeItem::Redo => PredefinedMenuItem::redo(None),
        NativeItem::Cut => PredefinedMenuItem::cut(None),
        NativeItem::Copy => PredefinedMenuItem::copy(None),
        NativeItem::Paste => PredefinedMenuItem::paste(None),
        NativeItem::SelectAll => PredefinedMenuItem::select_all(None),
        NativeItem::CloseWindow => PredefinedMenuItem::close_window(None),
        NativeItem::About => PredefinedMenuItem::about(
            Some(&format!("About {}", APP_NAME)),
            Some(AboutMetadata {
                name: Some(APP_NAME.to_string()),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
                website: Some(WEBSITE_URL.to_string()),
                ..Default::default()
            }),
        ),
        NativeItem::Services => PredefinedMenuItem::services(None),
        NativeItem::Hide => PredefinedMenuItem::hide(None),
        NativeItem::HideOthers => PredefinedMenuItem::hide_others(None),
        NativeItem::ShowAll => PredefinedMenuItem::show_all(None),
        NativeItem::Minimize => PredefinedMenuItem::minimize(None),
        NativeItem::Maximize => PredefinedMenuItem::maximize(None),
        NativeItem::Fullscreen => PredefinedMenuItem::fullscreen(None),
        NativeItem::BringAllToFront => PredefinedMenuItem::bring_all_to_front(None),
    }
}

fn menu_error(e: muda::Error) -> ChatwaveError {
    ChatwaveError::menu(e.to_string())
}
