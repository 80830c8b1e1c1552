pub mod fund;
pub mod relay;

pub use fund::{FundEvent, FundRecord};
pub use relay::{ConnectionStatus, RelayMessage, RelayUpdate};
