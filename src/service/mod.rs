//! Services: record list/create and account operations over a `RecordStore`.

mod accounts;
pub mod mapper;
mod records;
pub mod validation;

pub use accounts::{AccountService, INVALID_CREDENTIALS_MESSAGE, RESET_SENT_MESSAGE};
pub use mapper::map_row;
pub use records::RecordService;
pub use validation::{parse_timestamp, to_bool, to_decimal, validate_submission};
