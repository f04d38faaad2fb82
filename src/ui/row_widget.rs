// Row widget for displaying one justified row of gallery tiles
// Recycled across binds by the list item factory

use gdk4::Texture;
use glib::Object;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{
    gdk, glib, Align, Box as GtkBox, ContentFit, GestureClick, Label, Orientation, Overlay, Picture,
};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::OnceLock;

use crate::models::RowModel;

const TILE_TEXTURE_SIZE: usize = 128;

// Placeholder texture - generated once and reused
fn placeholder_texture() -> &'static Texture {
    static PLACEHOLDER: OnceLock<Texture> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        let size = 64usize;
        let mut pixels = vec![0u8; size * size * 4];

        // Dark gray (#1a1a1a) RGBA
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[0x1a, 0x1a, 0x1a, 0xff]);
        }

        let bytes = glib::Bytes::from_owned(pixels);
        gdk::MemoryTexture::new(
            size as i32,
            size as i32,
            gdk::MemoryFormat::R8g8b8a8,
            &bytes,
            size * 4,
        )
        .upcast()
    })
}

// Folder tile texture - outline of a folder in the accent color
fn folder_texture() -> &'static Texture {
    static FOLDER: OnceLock<Texture> = OnceLock::new();
    FOLDER.get_or_init(|| {
        let size = TILE_TEXTURE_SIZE;
        let mut pixels = vec![0u8; size * size * 4];

        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[0x12, 0x12, 0x12, 0xff]);
        }

        let accent = [0x00u8, 0xff, 0x88, 0xff];
        let mut set_px = |x: usize, y: usize| {
            let idx = (y * size + x) * 4;
            pixels[idx..idx + 4].copy_from_slice(&accent);
        };

        // Folder body outline, with a tab across the top-left
        let (left, right, top, bottom) = (20usize, 107usize, 40usize, 95usize);
        let (tab_width, tab_height) = (34usize, 10usize);

        for x in left..=right {
            set_px(x, top);
            set_px(x, bottom);
        }
        for y in top..=bottom {
            set_px(left, y);
            set_px(right, y);
        }
        for x in left..left + tab_width {
            set_px(x, top - tab_height);
        }
        for y in (top - tab_height)..top {
            set_px(left, y);
            set_px(left + tab_width - 1, y);
        }

        let bytes = glib::Bytes::from_owned(pixels);
        gdk::MemoryTexture::new(
            size as i32,
            size as i32,
            gdk::MemoryFormat::R8g8b8a8,
            &bytes,
            size * 4,
        )
        .upcast()
    })
}

// GObject subclass for RowWidget
mod imp {
    use super::*;

    /// One tile slot: an overlay holding the picture and a folder-name label
    pub struct ItemSlot {
        pub widget: gtk4::Widget,
        pub picture: Picture,
        pub label: Label,
    }

    #[derive(Default)]
    pub struct RowWidgetInner {
        pub slots: RefCell<Vec<ItemSlot>>,
        pub item_paths: RefCell<Vec<PathBuf>>,
        pub row_index: Cell<u32>,
        pub on_item_activated: RefCell<Option<Rc<dyn Fn(u32, u32, PathBuf)>>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for RowWidgetInner {
        const NAME: &'static str = "JgalRowWidget";
        type Type = super::RowWidget;
        type ParentType = GtkBox;
    }

    impl ObjectImpl for RowWidgetInner {
        fn constructed(&self) {
            self.parent_constructed();

            let obj = self.obj();
            obj.set_orientation(Orientation::Horizontal);
            obj.set_spacing(8);
            obj.set_margin_bottom(8);
            obj.set_homogeneous(false);
            obj.set_halign(Align::Start);
            obj.set_valign(Align::Start);
            obj.add_css_class("gallery-row");
        }
    }

    impl WidgetImpl for RowWidgetInner {}
    impl BoxImpl for RowWidgetInner {}
}

glib::wrapper! {
    pub struct RowWidget(ObjectSubclass<imp::RowWidgetInner>)
        @extends GtkBox, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget, gtk4::Orientable;
}

impl RowWidget {
    pub fn new() -> Self {
        Object::builder().build()
    }

    /// Match the widget's spacing to the layout gap so rendered rows line
    /// up with the computed geometry.
    pub fn set_row_gap(&self, gap: i32) {
        self.set_spacing(gap.max(0));
        self.set_margin_bottom(gap.max(0));
    }

    /// Bind a RowModel to this widget, creating/updating tile slots as needed
    pub fn bind(&self, row_model: &RowModel) {
        let imp = self.imp();
        let items = &row_model.items;
        let row_height = row_model.height_px;

        let mut slots = imp.slots.borrow_mut();
        let mut paths = imp.item_paths.borrow_mut();
        imp.row_index.set(row_model.row_index);

        // Ensure we have the right number of tile slots
        while slots.len() < items.len() {
            let slot = self.create_item_slot(slots.len() as u32);
            self.append(&slot.widget);
            slots.push(slot);
        }

        // Hide extra slots if we have too many
        for (i, slot) in slots.iter().enumerate() {
            slot.widget.set_visible(i < items.len());
        }

        paths.clear();
        paths.extend(items.iter().map(|item| item.path.clone()));

        // Apply the computed geometry and content
        for (i, item) in items.iter().enumerate() {
            let slot = &slots[i];
            slot.widget.set_size_request(item.width_px, row_height);
            slot.picture.set_size_request(item.width_px, row_height);

            if item.is_folder {
                slot.picture.set_paintable(Some(folder_texture()));
                let folder_name = item
                    .path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("[folder]");
                slot.label.set_text(folder_name);
                slot.label.set_visible(true);
            } else {
                slot.label.set_visible(false);
                // GTK rasterizes the file itself; cover-fit crops overflow.
                slot.picture.set_filename(Some(&item.path));
            }
        }
    }

    /// Unbind the current row model, preparing for reuse
    pub fn unbind(&self) {
        let imp = self.imp();
        let slots = imp.slots.borrow();

        for slot in slots.iter() {
            slot.picture.set_paintable(Some(placeholder_texture()));
            slot.widget.set_visible(false);
            slot.label.set_visible(false);
        }

        imp.item_paths.borrow_mut().clear();
    }

    pub fn connect_item_activated<F>(&self, callback: F)
    where
        F: Fn(u32, u32, PathBuf) + 'static,
    {
        *self.imp().on_item_activated.borrow_mut() = Some(Rc::new(callback));
    }

    fn create_item_slot(&self, index: u32) -> imp::ItemSlot {
        let picture = Picture::new();
        // Allow the widget to shrink to the allocated size; otherwise large
        // images only render a clipped fragment.
        picture.set_can_shrink(true);
        picture.set_content_fit(ContentFit::Cover);
        picture.add_css_class("gallery-item");

        let overlay = Overlay::new();
        overlay.set_child(Some(&picture));
        overlay.add_css_class("gallery-item");

        // Folder name overlay (hidden for images)
        let label = Label::new(None);
        label.set_halign(Align::Center);
        label.set_valign(Align::End);
        label.set_margin_bottom(8);
        label.add_css_class("folder-name");
        label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
        label.set_max_width_chars(15);
        label.set_visible(false);
        overlay.add_overlay(&label);

        let row_widget = self.clone();
        let click = GestureClick::new();
        click.set_button(1);
        click.connect_pressed(move |_, _n, _x, _y| {
            row_widget.emit_item_activated(index);
        });
        overlay.add_controller(click);

        imp::ItemSlot {
            widget: overlay.upcast(),
            picture,
            label,
        }
    }

    fn emit_item_activated(&self, index: u32) {
        let imp = self.imp();
        let row = imp.row_index.get();
        if let Some(path) = imp.item_paths.borrow().get(index as usize).cloned() {
            if let Some(ref callback) = *imp.on_item_activated.borrow() {
                callback(row, index, path);
            }
        }
    }
}

impl Default for RowWidget {
    fn default() -> Self {
        Self::new()
    }
}
