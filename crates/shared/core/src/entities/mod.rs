mod account;
mod events;
mod order;
mod order_state;
mod order_type;
mod side;
mod signal;

pub use account::AccountSnapshot;
pub use events::{DealEvent, FillEvent};
pub use order::{Order, OrderId, TradeId};
pub use order_state::OrderState;
pub use order_type::OrderType;
pub use side::Side;
pub use signal::{EntrySignal, ExitSignal, Signal};
