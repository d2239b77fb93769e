use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::utils::parse_wire_timestamp;

/// One conversation row exactly as the conversation webhook returns it.
/// Field names follow the upstream wire format (Portuguese column aliases
/// produced by the reporting query).
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationDto {
    pub id: i64,
    #[serde(default)]
    pub modelo: String,
    #[serde(default)]
    pub token_entrada: u64,
    #[serde(rename = "token_saída", default)]
    pub token_saida: u64,
    #[serde(default)]
    pub token_total: u64,
    #[serde(rename = "seção", default)]
    pub secao: String,
    #[serde(rename = "prompt_usuário", default)]
    pub prompt_usuario: String,
    #[serde(default)]
    pub resposta_agente: String,
    /// Wire date, `DD/MM/YY` (two-digit year) or `DD/MM/YYYY`.
    #[serde(default)]
    pub data: String,
    /// Wire time, `HH:MM:SS`; may be empty.
    #[serde(default)]
    pub hora: String,
    #[serde(default)]
    pub sistema: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub setor: Option<String>,
    #[serde(default)]
    pub ferramentas: Option<String>,
}

/// A conversation record after wire normalization. Read-only input to the
/// cost calculator; never mutated.
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub id: i64,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub section: String,
    pub system: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub sector: Option<String>,
    pub tools_used: Option<String>,
    pub user_prompt: String,
    pub agent_response: String,
    /// Raw wire date/time, kept for month keys and display.
    pub date: String,
    pub time: String,
    /// Combined instant; `None` when the wire date/time is malformed.
    /// Such records are unpriceable, never an error.
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<ConversationDto> for ConversationRecord {
    fn from(dto: ConversationDto) -> Self {
        let timestamp = parse_wire_timestamp(&dto.data, &dto.hora);
        ConversationRecord {
            id: dto.id,
            model: dto.modelo,
            input_tokens: dto.token_entrada,
            output_tokens: dto.token_saida,
            section: dto.secao,
            system: dto.sistema,
            username: dto.username.filter(|s| !s.is_empty()),
            email: dto.email.filter(|s| !s.is_empty()),
            sector: dto.setor.filter(|s| !s.is_empty()),
            tools_used: dto.ferramentas.filter(|s| !s.is_empty()),
            user_prompt: dto.prompt_usuario,
            agent_response: dto.resposta_agente,
            date: dto.data,
            time: dto.hora,
            timestamp,
        }
    }
}
