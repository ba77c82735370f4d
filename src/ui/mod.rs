pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, summary_row};
pub use progress::Spinner;
pub use table::{books_table, stats_table};
pub use theme::{theme, Theme};
