// Main window for the jgal justified gallery
// GTK4 ApplicationWindow with a ListView grid and terminal aesthetic CSS

use gdk4::Display;
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, Button, CheckButton, CssProvider, Entry,
    Label, Orientation, Settings, SpinButton, Window, STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::mpsc;
use std::time::Duration;

use super::list_view::GalleryListView;
use crate::layout::CachedLayoutComputer;
use crate::models::{GalleryItem, RowModel};
use crate::scanner::{FileScanner, ScanConfig};

const DIALOG_MARGIN: i32 = 12;
const FALLBACK_LAYOUT_WIDTH: f32 = 1200.0;
/// Quiescence window for resize-driven re-layouts.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

fn default_home_dir() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

fn default_start_dir() -> Option<PathBuf> {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.picture_dir().map(Path::to_path_buf))
        .or_else(default_home_dir)
}

struct DirectoryScanResult {
    items: Vec<GalleryItem>,
}

struct DialogShell {
    dialog: Window,
    content: GtkBox,
    close_button: Button,
}

/// CSS for terminal aesthetic - embedded
const EMBEDDED_CSS: &str = r#"
* {
    border-radius: 0;
    box-shadow: none;
    background-image: none;
}

window {
    background-color: #0a0a0a;
    color: #e0e0e0;
}

button {
    background-color: transparent;
    border: 1px solid #333333;
    color: #e0e0e0;
}

button:hover {
    background-color: rgba(224, 224, 224, 0.05);
    border-color: #555555;
}

.gallery-row {
    background-color: #0a0a0a;
    padding: 0;
}

.gallery-item {
    background-color: #121212;
    margin: 0;
}

.gallery-item:hover {
    outline: 1px solid #555555;
}

.folder-name {
    background-color: rgba(0, 0, 0, 0.7);
    color: #00ff88;
    padding: 4px 8px;
    font-size: 11px;
    font-weight: bold;
}

.dir-label, .status-bar {
    font-family: monospace;
    font-size: 12px;
}
"#;

/// Load and apply CSS stylesheet for terminal aesthetic
fn load_css() {
    let provider = CssProvider::new();
    provider.load_from_string(EMBEDDED_CSS);

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

/// Main window for the gallery
pub struct MainWindow {
    self_weak: RefCell<Weak<MainWindow>>,
    window: ApplicationWindow,
    list_view: Rc<GalleryListView>,
    layout: RefCell<CachedLayoutComputer>,
    current_path: RefCell<Option<PathBuf>>,
    gallery_items: RefCell<Vec<GalleryItem>>,
    folder_paths: RefCell<HashSet<PathBuf>>,
    status_label: Label,
    dir_label: Label,
    parent_button: Button,
    last_layout_width: Cell<i32>,
    resize_relayout_pending: Cell<bool>,
    scan_generation: Cell<u64>,
    recursive_scan: Cell<bool>,
    prefer_dark: Cell<bool>,
}

impl MainWindow {
    pub fn new(app: &Application, initial_path: Option<&Path>) -> Rc<Self> {
        // Load CSS before creating widgets
        load_css();
        if let Some(settings) = Settings::default() {
            settings.set_gtk_application_prefer_dark_theme(true);
        }

        let window = ApplicationWindow::builder()
            .application(app)
            .title("jgal - Justified Gallery")
            .default_width(1200)
            .default_height(800)
            .build();

        let root = GtkBox::new(Orientation::Vertical, 0);

        // Directory header bar
        let dir_bar = GtkBox::new(Orientation::Horizontal, 8);
        dir_bar.add_css_class("dir-bar");
        dir_bar.set_margin_start(8);
        dir_bar.set_margin_end(8);
        dir_bar.set_margin_top(4);
        dir_bar.set_margin_bottom(4);

        let parent_button = Button::with_label("[..]");
        parent_button.set_tooltip_text(Some("Go to parent directory"));
        parent_button.add_css_class("btn-nav");

        let dir_label = Label::new(Some("> No directory"));
        dir_label.set_halign(Align::Start);
        dir_label.set_hexpand(true);
        dir_label.add_css_class("dir-label");
        dir_label.set_ellipsize(gtk4::pango::EllipsizeMode::Start);

        let open_button = Button::with_label("[o] Open");
        let settings_button = Button::with_label("[s] Settings");

        dir_bar.append(&parent_button);
        dir_bar.append(&dir_label);
        dir_bar.append(&open_button);
        dir_bar.append(&settings_button);

        // The gallery grid
        let list_view = Rc::new(GalleryListView::new());

        // Status bar
        let status_bar = GtkBox::new(Orientation::Horizontal, 0);
        status_bar.add_css_class("status-bar");
        let status_label = Label::new(Some("> Ready"));
        status_label.set_halign(Align::Start);
        status_label.set_margin_start(8);
        status_label.set_margin_top(2);
        status_label.set_margin_bottom(2);
        status_bar.append(&status_label);

        root.append(&dir_bar);
        root.append(list_view.widget());
        root.append(&status_bar);
        window.set_child(Some(&root));

        let main_window = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            list_view,
            layout: RefCell::new(CachedLayoutComputer::new()),
            current_path: RefCell::new(None),
            gallery_items: RefCell::new(Vec::new()),
            folder_paths: RefCell::new(HashSet::new()),
            status_label,
            dir_label,
            parent_button: parent_button.clone(),
            last_layout_width: Cell::new(0),
            resize_relayout_pending: Cell::new(false),
            scan_generation: Cell::new(0),
            recursive_scan: Cell::new(false),
            prefer_dark: Cell::new(true),
        });
        *main_window.self_weak.borrow_mut() = Rc::downgrade(&main_window);

        let gap = main_window.layout.borrow().layout().gap;
        main_window.list_view.set_row_gap(gap.round() as i32);

        let window_weak = main_window.self_weak.borrow().clone();
        parent_button.connect_clicked(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.navigate_to_parent();
            }
        });

        let window_weak = main_window.self_weak.borrow().clone();
        open_button.connect_clicked(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.prompt_open_directory();
            }
        });

        let window_weak = main_window.self_weak.borrow().clone();
        settings_button.connect_clicked(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.open_settings();
            }
        });

        // Folder tiles navigate; image tiles just echo their path
        let window_weak = main_window.self_weak.borrow().clone();
        main_window
            .list_view
            .connect_item_activated(move |_row, _col, path| {
                if let Some(window) = window_weak.upgrade() {
                    if window.is_folder_path(&path) {
                        window.navigate_into_folder(&path);
                    } else {
                        window.set_status(&format!("> {}", path.display()));
                    }
                }
            });

        main_window.setup_layout_resize_observer();

        // Recompute grid rows when scrollbar visibility changes (content width changes).
        let window_weak = main_window.self_weak.borrow().clone();
        main_window
            .list_view
            .connect_vscrollbar_visibility_changed(move |_visible| {
                if let Some(window) = window_weak.upgrade() {
                    window.schedule_grid_relayout_debounced(Duration::from_millis(40));
                }
            });

        let start = initial_path
            .map(Path::to_path_buf)
            .or_else(default_start_dir);
        match start {
            Some(path) if path.is_dir() => main_window.load_directory(&path),
            _ => main_window.set_status("> No directory. [o] Open one"),
        }

        main_window
    }

    fn sanitize_positive_width(value: f32) -> Option<f32> {
        if value.is_finite() && value > 0.0 {
            Some(value.max(1.0))
        } else {
            None
        }
    }

    fn build_dialog_shell(&self, title: &str, width: i32) -> DialogShell {
        let dialog = Window::builder()
            .title(title)
            .transient_for(&self.window)
            .modal(true)
            .resizable(false)
            .default_width(width)
            .build();

        let content = GtkBox::new(Orientation::Vertical, 12);
        content.set_margin_top(DIALOG_MARGIN);
        content.set_margin_bottom(DIALOG_MARGIN);
        content.set_margin_start(DIALOG_MARGIN);
        content.set_margin_end(DIALOG_MARGIN);

        let header = GtkBox::new(Orientation::Horizontal, 8);
        let close_button = Button::with_label("Close");
        header.append(&close_button);
        let header_spacer = GtkBox::new(Orientation::Horizontal, 0);
        header_spacer.set_hexpand(true);
        header.append(&header_spacer);
        content.append(&header);

        dialog.set_child(Some(&content));

        DialogShell {
            dialog,
            content,
            close_button,
        }
    }

    /// Pick the width the packer sees. The list view's allocation wins once
    /// it is realized; before that, fall back without exceeding the window.
    fn effective_layout_width(viewport_width: f32, window_alloc: i32, fallback: f32) -> f32 {
        let chosen_width = if viewport_width > 100.0 && viewport_width.is_finite() {
            viewport_width
        } else {
            fallback
        };

        let mut width = Self::sanitize_positive_width(chosen_width).unwrap_or(1.0);
        if let Some(cap) = Self::sanitize_positive_width(window_alloc as f32) {
            width = width.min(cap);
        }

        width.max(1.0)
    }

    fn current_effective_width(&self, fallback: f32) -> f32 {
        let viewport_width = self.list_view.content_width();
        Self::effective_layout_width(viewport_width, self.window.width(), fallback)
    }

    fn build_rows_for_items(&self, items: &[GalleryItem]) -> Vec<RowModel> {
        let effective_width = self.current_effective_width(FALLBACK_LAYOUT_WIDTH);
        self.layout.borrow().compute(items, effective_width)
    }

    fn apply_rows(&self, rows: Vec<RowModel>) {
        self.list_view.set_rows(rows);
    }

    fn apply_items(&self, items: Vec<GalleryItem>) {
        let mut folders = HashSet::new();
        for item in &items {
            if item.is_folder() {
                folders.insert(item.path.clone());
            }
        }
        *self.folder_paths.borrow_mut() = folders;
        *self.gallery_items.borrow_mut() = items.clone();

        let rows = self.build_rows_for_items(&items);
        self.apply_rows(rows);
    }

    fn schedule_grid_relayout(&self) {
        self.schedule_grid_relayout_after(Duration::from_millis(50));
    }

    fn schedule_grid_relayout_after(&self, delay: Duration) {
        let weak_self = self.self_weak.borrow().clone();
        glib::timeout_add_local(delay, move || {
            if let Some(window) = weak_self.upgrade() {
                window.recalculate_grid_layout();
            }
            glib::ControlFlow::Break
        });
    }

    /// Debounced re-layout: a single pending timer coalesces rapid
    /// triggers until the container width has been quiet for `delay`.
    fn schedule_grid_relayout_debounced(&self, delay: Duration) {
        if self.resize_relayout_pending.replace(true) {
            return;
        }
        let weak_self = self.self_weak.borrow().clone();
        glib::timeout_add_local(delay, move || {
            if let Some(window) = weak_self.upgrade() {
                window.resize_relayout_pending.set(false);
                window.recalculate_grid_layout();
            }
            glib::ControlFlow::Break
        });
    }

    fn recalculate_grid_layout(&self) {
        let items = self.gallery_items.borrow().clone();
        if items.is_empty() {
            return;
        }

        let width = self.list_view.content_width();
        tracing::debug!(
            "layout-widths content={:.1} window_alloc={}",
            width,
            self.window.width()
        );
        let rows = self.build_rows_for_items(&items);
        self.apply_rows(rows);
    }

    /// Watch the grid's content width and schedule a debounced re-layout
    /// whenever it changes meaningfully.
    fn setup_layout_resize_observer(self: &Rc<Self>) {
        let weak_self = Rc::downgrade(self);
        let scrolled = self.list_view.widget().clone();
        scrolled.add_tick_callback(move |_widget, _clock| {
            if let Some(window) = weak_self.upgrade() {
                let width = window.list_view.content_width().round() as i32;
                if width <= 0 {
                    return glib::ControlFlow::Continue;
                }
                let last = window.last_layout_width.get();
                if (width - last).abs() >= 1 {
                    window.last_layout_width.set(width);
                    window.schedule_grid_relayout_debounced(RESIZE_DEBOUNCE);
                }
            }
            glib::ControlFlow::Continue
        });
    }

    /// Load a directory and display its gallery
    pub fn load_directory(&self, path: &Path) {
        self.set_status(&format!("> Scanning: {}", path.display()));
        self.set_current_path(Some(path.to_path_buf()));

        let generation = self.scan_generation.get().wrapping_add(1);
        self.scan_generation.set(generation);

        let path_buf = path.to_path_buf();
        let recursive = self.recursive_scan.get();
        let (tx, rx) = mpsc::channel::<(u64, DirectoryScanResult)>();
        std::thread::spawn(move || {
            let scanner = FileScanner::with_config(ScanConfig { recursive });
            let items = match scanner.scan_directory(&path_buf) {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!(error = %err, "Directory scan failed");
                    Vec::new()
                }
            };
            let _ = tx.send((generation, DirectoryScanResult { items }));
        });

        let requested_path = path.to_path_buf();
        let weak_self = self.self_weak.borrow().clone();
        glib::timeout_add_local(Duration::from_millis(16), move || match rx.try_recv() {
            Ok((result_generation, result)) => {
                if let Some(window) = weak_self.upgrade() {
                    window.apply_directory_scan_result(&requested_path, result_generation, result);
                }
                glib::ControlFlow::Break
            }
            Err(mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
            Err(mpsc::TryRecvError::Disconnected) => glib::ControlFlow::Break,
        });
    }

    fn apply_directory_scan_result(
        &self,
        requested_path: &Path,
        result_generation: u64,
        result: DirectoryScanResult,
    ) {
        if result_generation != self.scan_generation.get() {
            return;
        }
        let current = self.current_path.borrow().clone();
        if current.as_deref() != Some(requested_path) {
            return;
        }

        self.apply_items(result.items);
        let items = self.gallery_items.borrow();
        let folder_count = items.iter().filter(|i| i.is_folder()).count();
        let image_count = items.len().saturating_sub(folder_count);
        let total_bytes: i64 = items.iter().map(|i| i.size).sum();
        drop(items);

        self.set_status(&format!(
            "> {} folders, {} images ({:.1} MB) | {} rows | [click] Open folder",
            folder_count,
            image_count,
            total_bytes as f64 / (1024.0 * 1024.0),
            self.list_view.row_count()
        ));
    }

    /// Navigate to the parent directory
    pub fn navigate_to_parent(&self) {
        if let Some(current) = self.current_path() {
            if let Some(parent) = current.parent() {
                self.load_directory(parent);
            }
        }
    }

    /// Check if a path is a folder
    pub fn is_folder_path(&self, path: &Path) -> bool {
        self.folder_paths.borrow().contains(path)
    }

    /// Navigate into a folder
    pub fn navigate_into_folder(&self, path: &Path) {
        tracing::info!("Navigating into folder: {}", path.display());
        self.load_directory(path);
    }

    fn expand_path_input(&self, input: &str) -> PathBuf {
        if input == "~" || input.starts_with("~/") {
            if let Some(home) = default_home_dir() {
                if input == "~" {
                    return home;
                }
                let rest = input.trim_start_matches("~/");
                return home.join(rest);
            }
        }
        PathBuf::from(input)
    }

    fn prompt_open_directory(&self) {
        let dialog_shell = self.build_dialog_shell("Open directory", 520);
        let dialog = dialog_shell.dialog;
        let content = dialog_shell.content;
        let close_button = dialog_shell.close_button;

        let entry = Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("/path/to/folder"));
        if let Some(current) = self.current_path() {
            entry.set_text(current.to_string_lossy().as_ref());
            entry.select_region(0, -1);
        }
        content.append(&entry);

        let buttons = GtkBox::new(Orientation::Horizontal, 8);
        buttons.set_halign(Align::End);
        let cancel_button = Button::with_label("Cancel");
        let open_button = Button::with_label("Open");
        buttons.append(&cancel_button);
        buttons.append(&open_button);
        content.append(&buttons);

        let dialog_weak = dialog.downgrade();
        let close_dialog = Rc::new(move || {
            if let Some(dialog) = dialog_weak.upgrade() {
                dialog.close();
            }
        });

        let window_weak = self.self_weak.borrow().clone();
        let entry_for_open = entry.clone();
        let close_dialog_for_open = close_dialog.clone();
        let open_action = Rc::new(move || {
            if let Some(window) = window_weak.upgrade() {
                let input = entry_for_open.text().to_string();
                let input = input.trim();
                if !input.is_empty() {
                    let path = window.expand_path_input(input);
                    if path.is_dir() {
                        window.load_directory(&path);
                    } else {
                        window.set_status(&format!("> Not a directory: {}", path.display()));
                    }
                }
            }
            close_dialog_for_open();
        });

        let open_action_for_button = open_action.clone();
        open_button.connect_clicked(move |_| {
            open_action_for_button();
        });

        let open_action_for_entry = open_action.clone();
        entry.connect_activate(move |_| {
            open_action_for_entry();
        });

        let close_dialog_for_cancel = close_dialog.clone();
        cancel_button.connect_clicked(move |_| {
            close_dialog_for_cancel();
        });

        let close_dialog_for_close = close_dialog.clone();
        close_button.connect_clicked(move |_| {
            close_dialog_for_close();
        });

        dialog.set_default_widget(Some(&open_button));
        dialog.present();
        entry.grab_focus();
    }

    fn open_settings(&self) {
        let dialog_shell = self.build_dialog_shell("Settings", 420);
        let dialog = dialog_shell.dialog;
        let content = dialog_shell.content;
        let close_button = dialog_shell.close_button;

        let dark_toggle = CheckButton::with_label("Dark mode");
        dark_toggle.set_active(self.prefer_dark.get());
        content.append(&dark_toggle);

        let recursive_toggle = CheckButton::with_label("Recursive scan");
        recursive_toggle.set_active(self.recursive_scan.get());
        content.append(&recursive_toggle);

        let height_row = GtkBox::new(Orientation::Horizontal, 8);
        let height_label = Label::new(Some("Row height"));
        height_label.set_hexpand(true);
        height_label.set_halign(Align::Start);
        let height_spin = SpinButton::with_range(80.0, 600.0, 10.0);
        height_spin.set_value(self.layout.borrow().layout().target_height as f64);
        height_row.append(&height_label);
        height_row.append(&height_spin);
        content.append(&height_row);

        let gap_row = GtkBox::new(Orientation::Horizontal, 8);
        let gap_label = Label::new(Some("Gap"));
        gap_label.set_hexpand(true);
        gap_label.set_halign(Align::Start);
        let gap_spin = SpinButton::with_range(0.0, 64.0, 1.0);
        gap_spin.set_value(self.layout.borrow().layout().gap as f64);
        gap_row.append(&gap_label);
        gap_row.append(&gap_spin);
        content.append(&gap_row);

        let window_weak = self.self_weak.borrow().clone();
        dark_toggle.connect_toggled(move |toggle| {
            if let Some(window) = window_weak.upgrade() {
                window.set_prefer_dark(toggle.is_active());
            }
        });

        let window_weak = self.self_weak.borrow().clone();
        recursive_toggle.connect_toggled(move |toggle| {
            if let Some(window) = window_weak.upgrade() {
                window.set_recursive_scan(toggle.is_active());
            }
        });

        let window_weak = self.self_weak.borrow().clone();
        let gap_spin_for_height = gap_spin.clone();
        height_spin.connect_value_changed(move |spin| {
            if let Some(window) = window_weak.upgrade() {
                window.set_layout_config(spin.value() as f32, gap_spin_for_height.value() as f32);
            }
        });

        let window_weak = self.self_weak.borrow().clone();
        let height_spin_for_gap = height_spin.clone();
        gap_spin.connect_value_changed(move |spin| {
            if let Some(window) = window_weak.upgrade() {
                window.set_layout_config(height_spin_for_gap.value() as f32, spin.value() as f32);
            }
        });

        let dialog_weak = dialog.downgrade();
        close_button.connect_clicked(move |_| {
            if let Some(dialog) = dialog_weak.upgrade() {
                dialog.close();
            }
        });

        dialog.present();
    }

    fn set_prefer_dark(&self, enabled: bool) {
        self.prefer_dark.set(enabled);
        if let Some(settings) = Settings::default() {
            settings.set_gtk_application_prefer_dark_theme(enabled);
        }
    }

    fn set_recursive_scan(&self, enabled: bool) {
        self.recursive_scan.set(enabled);
        if let Some(path) = self.current_path() {
            self.load_directory(&path);
        }
    }

    /// Swap in a new packer configuration and re-lay the grid out.
    fn set_layout_config(&self, target_height: f32, gap: f32) {
        {
            let mut computer = self.layout.borrow_mut();
            let mut layout = computer.layout().clone();
            layout.target_height = target_height.max(1.0);
            layout.gap = gap.max(0.0);
            computer.set_layout(layout);
        }
        self.list_view.set_row_gap(gap.round() as i32);
        self.schedule_grid_relayout();
    }

    fn update_header(&self) {
        let current = self.current_path.borrow().clone();
        if let Some(p) = current {
            let dir_name = p
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| p.display().to_string());
            self.window.set_title(Some(&format!("jgal - {}", dir_name)));
            self.dir_label.set_text(&format!("> {}", p.display()));
            self.parent_button.set_sensitive(p.parent().is_some());
        } else {
            self.window.set_title(Some("jgal - Justified Gallery"));
            self.dir_label.set_text("> No directory");
            self.parent_button.set_sensitive(false);
        }
    }

    /// Get the current directory path
    pub fn current_path(&self) -> Option<PathBuf> {
        self.current_path.borrow().clone()
    }

    /// Set the current directory path
    pub fn set_current_path(&self, path: Option<PathBuf>) {
        *self.current_path.borrow_mut() = path;
        self.update_header();
    }

    /// Set status bar text
    pub fn set_status(&self, status: &str) {
        self.status_label.set_text(status);
    }

    /// Present the window
    pub fn present(&self) {
        self.window.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_layout_width_prefers_viewport() {
        let width = MainWindow::effective_layout_width(1000.0, 1200, 1200.0);
        assert!((width - 1000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_effective_layout_width_falls_back_when_unrealized() {
        // Allocation of 0 means the widget has not been realized yet.
        let width = MainWindow::effective_layout_width(0.0, 0, 1200.0);
        assert!((width - 1200.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_effective_layout_width_capped_by_window() {
        let width = MainWindow::effective_layout_width(0.0, 800, 1200.0);
        assert!((width - 800.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sanitize_positive_width() {
        assert_eq!(MainWindow::sanitize_positive_width(-1.0), None);
        assert_eq!(MainWindow::sanitize_positive_width(f32::NAN), None);
        assert_eq!(MainWindow::sanitize_positive_width(0.5), Some(1.0));
        assert_eq!(MainWindow::sanitize_positive_width(640.0), Some(640.0));
    }
}
