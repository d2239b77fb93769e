use serde::Deserialize;

use super::pricing::de_flag;

/// Advisory role flags returned by the permission webhook. These gate which
/// aggregation views are shown; they have no effect on pricing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RoleFlags {
    #[serde(default, deserialize_with = "de_flag")]
    pub admin: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub visualizador: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub controladoria: bool,
}

impl RoleFlags {
    /// Whether the holder may see records belonging to other users.
    pub fn sees_all(&self) -> bool {
        self.admin || self.controladoria
    }
}
