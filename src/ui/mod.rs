pub mod list_view;
pub mod row_widget;
pub mod window;

pub use window::MainWindow;
