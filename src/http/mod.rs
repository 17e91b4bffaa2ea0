//! Backend access: transport seam, token-refreshing gateway, typed endpoints.

mod api;
mod gateway;
mod transport;

pub use api::{
	Api, AssociationQuery, GroupingStrategy, LoginForm, MultiWordLogic, NlpParams, RegistrationForm, SearchHit,
	SearchOutcome, UserRecord, VariationOutcome, filter_users,
};
