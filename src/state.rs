mod memory;
mod record;
mod session;

pub use memory::InMemoryUserStore;
pub use record::UserRecord;
pub use session::{parse_date, UserSession};
