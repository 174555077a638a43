mod alert;
mod command_input;
mod confirm;
mod input;
mod key_result;
mod proposal_picker;

pub use alert::AlertDialog;
pub use command_input::{CommandEvent, CommandInput};
pub use confirm::{ConfirmDialog, ConfirmEvent};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use proposal_picker::{ProposalPicker, ProposalPickerEvent};
