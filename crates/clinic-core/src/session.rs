//! Login responses and bearer tokens.
//!
//! Tokens are random and opaque. Nothing remembers them after they are
//! issued.

use rand_core::{OsRng, RngCore as _};
use serde::Serialize;

use crate::model::{Identity, Role};

const TOKEN_BYTES: usize = 24;

/// What a successful login hands back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
  pub token: String,
  pub role:  Role,
  pub id:    u64,
  pub name:  String,
}

impl Session {
  pub fn issue(identity: Identity) -> Self {
    let Identity { role, id, name } = identity;
    Self { token: new_token(), role, id, name }
  }
}

fn new_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens_are_hex_and_distinct() {
    let identity = Identity { role: Role::Patient, id: 1, name: "Ann".into() };
    let a = Session::issue(identity.clone());
    let b = Session::issue(identity);
    assert_eq!(a.token.len(), TOKEN_BYTES * 2);
    assert!(a.token.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a.token, b.token);
    assert_eq!(a.role, Role::Patient);
  }
}
