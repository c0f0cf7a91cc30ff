// Battle.net infra layer.
// - `battlenet_client.rs` talks to the OAuth2 token endpoint and the
//   connected-realm API.

#[path = "battlenet_client.rs"]
pub mod battlenet_client;

pub use battlenet_client::{BattleNetClient, ClientCredentials, RealmEndpoint};
