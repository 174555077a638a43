mod demand_list;
mod proposal_form;

pub use demand_list::DemandListView;
pub use proposal_form::ProposalFormView;
