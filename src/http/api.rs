use std::rc::Rc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::gateway::HttpGateway;
use super::transport::{ApiRequest, Endpoint, ReqwestTransport, Transport};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::graph::RawAssociationRecord;
use crate::quiz::{StudyReaction, Variation, VariationConfig};
use crate::session::{Action, Store, User};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoginForm {
	pub username: String,
	pub password: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationForm {
	pub username: String,
	pub email: String,
	pub password: String,
	pub first_name: String,
	pub last_name: String,
	/// Optional questionnaire fields; sent as `null` when left blank.
	pub gender: Option<String>,
	pub age: Option<u32>,
	pub education_level: Option<String>,
	pub specialty: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
	pub access: String,
	pub refresh: String,
	#[serde(default)]
	pub is_admin: bool,
	#[serde(default)]
	pub user: Option<User>,
}

/// Row of the admin user table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserRecord {
	pub id: u64,
	pub username: String,
	#[serde(default)]
	pub first_name: Option<String>,
	#[serde(default)]
	pub last_name: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
}

/// Case-insensitive match on username, first or last name.
pub fn filter_users<'a>(users: &'a [UserRecord], query: &str) -> Vec<&'a UserRecord> {
	let needle = query.to_lowercase();
	let hit = |field: &Option<String>| field.as_ref().is_some_and(|v| v.to_lowercase().contains(&needle));
	users
		.iter()
		.filter(|u| u.username.to_lowercase().contains(&needle) || hit(&u.first_name) || hit(&u.last_name))
		.collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingStrategy {
	Original,
	Processed,
	#[default]
	Lemmas,
	Synonyms,
}

impl GroupingStrategy {
	pub const ALL: [GroupingStrategy; 4] = [
		GroupingStrategy::Original,
		GroupingStrategy::Processed,
		GroupingStrategy::Lemmas,
		GroupingStrategy::Synonyms,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			GroupingStrategy::Original => "original",
			GroupingStrategy::Processed => "processed",
			GroupingStrategy::Lemmas => "lemmas",
			GroupingStrategy::Synonyms => "synonyms",
		}
	}

	pub fn parse(raw: &str) -> Self {
		Self::ALL
			.into_iter()
			.find(|s| s.as_str() == raw)
			.unwrap_or_default()
	}
}

/// Text normalisation the backend applies before grouping reactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NlpParams {
	pub preprocess: bool,
	pub remove_stops: bool,
	pub lemmatize: bool,
	pub group_syns: bool,
	pub grouping_strategy: GroupingStrategy,
}

impl Default for NlpParams {
	fn default() -> Self {
		Self {
			preprocess: true,
			remove_stops: true,
			lemmatize: true,
			group_syns: true,
			grouping_strategy: GroupingStrategy::default(),
		}
	}
}

impl NlpParams {
	pub fn to_query(&self) -> Vec<(String, String)> {
		vec![
			("preprocess".into(), self.preprocess.to_string()),
			("remove_stops".into(), self.remove_stops.to_string()),
			("lemmatize".into(), self.lemmatize.to_string()),
			("group_syns".into(), self.group_syns.to_string()),
			("grouping_strategy".into(), self.grouping_strategy.as_str().into()),
		]
	}

	fn merge_into(&self, body: &mut Value) {
		if let Value::Object(map) = body {
			for (key, value) in self.to_query() {
				map.insert(key, Value::String(value));
			}
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MultiWordLogic {
	And,
	#[default]
	Or,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociationQuery {
	pub reaction_description: String,
	pub match_exact_variation: bool,
	pub use_embeddings: bool,
	pub multi_word_logic: MultiWordLogic,
	pub nlp: NlpParams,
}

impl AssociationQuery {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			reaction_description: text.into(),
			match_exact_variation: true,
			use_embeddings: false,
			multi_word_logic: MultiWordLogic::default(),
			nlp: NlpParams::default(),
		}
	}

	fn to_body(&self) -> Value {
		let mut body = json!({
			"reaction_description": self.reaction_description.trim(),
			"match_exact_variation": self.match_exact_variation,
			"search_use_embeddings": self.use_embeddings.to_string(),
			"multi_word_logic": match self.multi_word_logic {
				MultiWordLogic::And => "AND",
				MultiWordLogic::Or => "OR",
			},
		});
		self.nlp.merge_into(&mut body);
		body
	}
}

/// One association search result; the payload shape varies with the
/// search mode, so fields are read on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit(pub Value);

impl SearchHit {
	/// Font name usable as a graph filter keyword.
	pub fn cipher_name(&self) -> Option<&str> {
		let details = self.0.get("details")?;
		details
			.get("cipher_name")
			.and_then(Value::as_str)
			.or_else(|| details.get("cipher")?.get("result")?.as_str())
	}

	pub fn best_reaction(&self) -> Option<&str> {
		self.0
			.get("best_reaction_text")
			.and_then(Value::as_str)
			.filter(|t| *t != "N/A")
	}

	pub fn relevance_percent(&self) -> Option<f64> {
		self.0.get("best_reaction_relevance_percentage")?.as_f64()
	}

	pub fn frequency(&self) -> u64 {
		self.0
			.get("best_reaction_frequency")
			.and_then(Value::as_u64)
			.unwrap_or(0)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
	Hits(Vec<SearchHit>),
	/// The backend explained why there is nothing to show.
	Message(String),
}

fn search_outcome(body: Value) -> SearchOutcome {
	match body {
		Value::Array(items) if items.is_empty() => SearchOutcome::Message("No results found.".into()),
		Value::Array(items) => SearchOutcome::Hits(items.into_iter().map(SearchHit).collect()),
		other => {
			let text = |key: &str| other.get(key).and_then(Value::as_str).map(str::to_string);
			match (text("message"), text("note"), text("error")) {
				(Some(message), Some(note), _) => SearchOutcome::Message(format!("{message} {note}")),
				(Some(message), None, _) => SearchOutcome::Message(message),
				(None, _, Some(error)) => SearchOutcome::Message(error),
				_ => SearchOutcome::Message("Unexpected response from the server.".into()),
			}
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum VariationOutcome {
	Next(Variation),
	AllSeen(Option<String>),
	NotFound,
}

fn variation_outcome(body: Value) -> Result<VariationOutcome, ApiError> {
	if body.get("all_seen").and_then(Value::as_bool) == Some(true) {
		let message = body.get("message").and_then(Value::as_str).map(str::to_string);
		return Ok(VariationOutcome::AllSeen(message));
	}
	Ok(VariationOutcome::Next(serde_json::from_value(body)?))
}

/// Typed calls to the study backend.
pub struct Api<T = ReqwestTransport> {
	gateway: Rc<HttpGateway<T>>,
}

impl<T> Clone for Api<T> {
	fn clone(&self) -> Self {
		Self {
			gateway: Rc::clone(&self.gateway),
		}
	}
}

impl Api<ReqwestTransport> {
	pub fn connect(config: &ClientConfig, store: Store) -> Self {
		info!("backend at {}", config.api_base_url);
		Self::new(ReqwestTransport::new(config.api_base_url.clone()), store)
	}
}

impl<T: Transport> Api<T> {
	pub fn new(transport: T, store: Store) -> Self {
		Self {
			gateway: Rc::new(HttpGateway::new(transport, store)),
		}
	}

	pub fn store(&self) -> &Store {
		self.gateway.store()
	}

	pub async fn register(&self, form: &RegistrationForm) -> Result<Value, ApiError> {
		let body = serde_json::to_value(form)?;
		self.gateway
			.send(ApiRequest::post("/users/register/", body).endpoint(Endpoint::Register))
			.await
	}

	/// Registers, then signs the new account in.
	pub async fn register_and_login(&self, form: &RegistrationForm) -> Result<LoginResponse, ApiError> {
		self.register(form).await?;
		self.login(&LoginForm {
			username: form.username.clone(),
			password: form.password.clone(),
		})
		.await
	}

	pub async fn login(&self, form: &LoginForm) -> Result<LoginResponse, ApiError> {
		let body = serde_json::to_value(form)?;
		let raw = self
			.gateway
			.send(ApiRequest::post("/users/login/", body).endpoint(Endpoint::Login))
			.await?;
		let response: LoginResponse = serde_json::from_value(raw)?;
		self.store().dispatch(Action::LoggedIn {
			access: response.access.clone(),
			refresh: response.refresh.clone(),
			is_admin: response.is_admin,
			user: response.user.clone(),
		});
		Ok(response)
	}

	pub fn logout(&self) {
		self.store().dispatch(Action::LoggedOut);
	}

	async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
		let raw = self.gateway.send_quiet(ApiRequest::get("/users/")).await?;
		Ok(serde_json::from_value(raw)?)
	}

	/// The admin table shows an empty list rather than an error.
	pub async fn list_users_or_empty(&self) -> Vec<UserRecord> {
		self.list_users().await.unwrap_or_else(|e| {
			warn!("user list unavailable: {e}");
			Vec::new()
		})
	}

	pub async fn delete_user(&self, id: u64) -> Result<(), ApiError> {
		self.gateway
			.send(ApiRequest::delete(format!("/users/{id}/")))
			.await
			.map(|_| ())
	}

	pub async fn graph_records(&self, params: &NlpParams) -> Result<Vec<RawAssociationRecord>, ApiError> {
		let raw = self
			.gateway
			.send(ApiRequest::get("/graph/").with_query(params.to_query()))
			.await?;
		match raw {
			Value::Array(_) => Ok(serde_json::from_value(raw)?),
			Value::Null => Ok(Vec::new()),
			other => Err(ApiError::Decode(format!("expected a list of records, got {other}"))),
		}
	}

	/// A 404 here means no fonts exist at all; it ends the survey quietly.
	pub async fn random_variation(&self, config: &VariationConfig) -> Result<VariationOutcome, ApiError> {
		let body = serde_json::to_value(config)?;
		match self.gateway.send_quiet(ApiRequest::post("/ciphers/random/", body)).await {
			Ok(raw) => variation_outcome(raw),
			Err(e) if e.is_not_found() => Ok(VariationOutcome::NotFound),
			Err(e) => Err(e),
		}
	}

	/// Returns the backend's confirmation message, if any.
	pub async fn save_study(&self, batch: &[StudyReaction]) -> Result<Option<String>, ApiError> {
		let raw = self
			.gateway
			.send(ApiRequest::post("/studies/", serde_json::to_value(batch)?))
			.await?;
		Ok(raw.get("message").and_then(Value::as_str).map(str::to_string))
	}

	pub async fn search_associations(&self, query: &AssociationQuery) -> Result<SearchOutcome, ApiError> {
		let raw = self
			.gateway
			.send(ApiRequest::post("/associations/search/", query.to_body()))
			.await?;
		Ok(search_outcome(raw))
	}

	pub async fn analyze_text(&self, text: &str, params: &NlpParams) -> Result<Value, ApiError> {
		let mut body = json!({ "text": text });
		params.merge_into(&mut body);
		self.gateway.send(ApiRequest::post("/nlp/analyze-text/", body)).await
	}

	pub async fn analyze_all_associations(&self, params: &NlpParams) -> Result<Value, ApiError> {
		self.gateway
			.send(ApiRequest::get("/nlp/analyze-all-associations/").with_query(params.to_query()))
			.await
	}

	pub async fn fast_grouped(&self, params: &NlpParams) -> Result<Value, ApiError> {
		self.gateway
			.send(ApiRequest::get("/nlp/fast-grouped/").with_query(params.to_query()))
			.await
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::collections::HashMap;

	use async_trait::async_trait;
	use futures::executor::block_on;

	use super::*;
	use crate::error::TransportError;
	use crate::http::transport::{ApiResponse, Method};
	use crate::session::MemoryStorage;

	/// Canned responses keyed by path; records every request.
	#[derive(Default)]
	struct Canned {
		responses: HashMap<String, ApiResponse>,
		seen: RefCell<Vec<ApiRequest>>,
	}

	impl Canned {
		fn with(mut self, path: &str, status: u16, body: Value) -> Self {
			self.responses.insert(path.to_string(), ApiResponse { status, body });
			self
		}
	}

	#[async_trait(?Send)]
	impl Transport for Canned {
		async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
			self.seen.borrow_mut().push(request.clone());
			self.responses
				.get(&request.path)
				.cloned()
				.ok_or_else(|| TransportError::Network("connection refused".into()))
		}
	}

	fn api(canned: Canned) -> Api<Canned> {
		Api::new(canned, Store::new(MemoryStorage::new()))
	}

	#[test]
	fn login_stores_session() {
		let api = api(Canned::default().with(
			"/users/login/",
			200,
			json!({"access": "a", "refresh": "r", "is_admin": true, "user": {"id": 1, "username": "ann"}}),
		));
		let response = block_on(api.login(&LoginForm {
			username: "ann".into(),
			password: "pw".into(),
		}))
		.unwrap();
		assert!(response.is_admin);
		let auth = api.store().auth();
		assert_eq!(auth.access_token.as_deref(), Some("a"));
		assert_eq!(auth.user.map(|u| u.username), Some("ann".to_string()));
	}

	#[test]
	fn graph_request_carries_nlp_query() {
		let api = api(Canned::default().with(
			"/graph/",
			200,
			json!([{"name": "Arial", "description": "calm", "count": 2}, {"name": null}]),
		));
		let records = block_on(api.graph_records(&NlpParams::default())).unwrap();
		assert_eq!(records.len(), 2);
		assert_eq!(records[0], RawAssociationRecord::new("Arial", "calm", 2));

		let seen = api.gateway.transport().seen.borrow();
		assert_eq!(seen[0].method, Method::Get);
		assert!(seen[0].query.contains(&("grouping_strategy".to_string(), "lemmas".to_string())));
		assert!(seen[0].query.contains(&("preprocess".to_string(), "true".to_string())));
	}

	#[test]
	fn random_variation_outcomes() {
		let all_seen = api(Canned::default().with(
			"/ciphers/random/",
			200,
			json!({"all_seen": true, "message": "done"}),
		));
		assert_eq!(
			block_on(all_seen.random_variation(&VariationConfig::default())).unwrap(),
			VariationOutcome::AllSeen(Some("done".into()))
		);

		let missing = api(Canned::default().with("/ciphers/random/", 404, json!({"error": "no fonts"})));
		assert_eq!(
			block_on(missing.random_variation(&VariationConfig::default())).unwrap(),
			VariationOutcome::NotFound
		);
		assert!(missing.store().state().notification.is_none());

		let next = api(Canned::default().with(
			"/ciphers/random/",
			200,
			json!({"cipher_id": 4, "result": "Lora", "font_weight": 700, "font_style": "italic",
				"letter_spacing": 1.5, "font_size": 14, "line_height": 1.2}),
		));
		match block_on(next.random_variation(&VariationConfig::default())).unwrap() {
			VariationOutcome::Next(v) => assert_eq!((v.cipher_id, v.result.as_str()), (4, "Lora")),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn users_fall_back_to_empty_list() {
		let api = api(Canned::default());
		assert!(block_on(api.list_users_or_empty()).is_empty());
		assert!(api.store().state().notification.is_none());
	}

	#[test]
	fn user_filter_checks_names() {
		let users = vec![
			UserRecord {
				id: 1,
				username: "anna".into(),
				first_name: None,
				last_name: Some("Petrova".into()),
				email: None,
			},
			UserRecord {
				id: 2,
				username: "bob".into(),
				first_name: Some("Robert".into()),
				last_name: None,
				email: None,
			},
		];
		let ids = |q: &str| filter_users(&users, q).iter().map(|u| u.id).collect::<Vec<_>>();
		assert_eq!(ids("PETR"), [1]);
		assert_eq!(ids("rob"), [2]);
		assert_eq!(ids(""), [1, 2]);
	}

	#[test]
	fn search_outcome_shapes() {
		let hits = search_outcome(json!([{"details": {"cipher": {"result": "Lora"}}, "best_reaction_text": "N/A"}]));
		let SearchOutcome::Hits(hits) = hits else {
			panic!("expected hits");
		};
		assert_eq!(hits[0].cipher_name(), Some("Lora"));
		assert_eq!(hits[0].best_reaction(), None);

		assert_eq!(
			search_outcome(json!({"message": "Nothing yet.", "note": "Try synonyms."})),
			SearchOutcome::Message("Nothing yet. Try synonyms.".into())
		);
		assert_eq!(
			search_outcome(json!({"error": "bad query"})),
			SearchOutcome::Message("bad query".into())
		);
		assert_eq!(search_outcome(json!([])), SearchOutcome::Message("No results found.".into()));
	}

	#[test]
	fn save_study_returns_confirmation() {
		let api = api(Canned::default().with("/studies/", 200, json!({"message": "saved"})));
		assert_eq!(block_on(api.save_study(&[])).unwrap().as_deref(), Some("saved"));
	}
}
