use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

/// AI 查询请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiQueryRequest {
    pub query: String,
    pub threshold: i32,
    pub system_prompt: String,
    pub prompt_variables: Map<String, JsonValue>,
    pub filter_expr: String,
    pub top_k: i32,
}

/// AI 查询响应体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiQueryResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunks: Vec<AiChunk>,
}

/// 检索参考片段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiChunk {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: AiChunkMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub embeddings: Vec<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiChunkMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub doc_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub datasource_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pipeline_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunk_index: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: i64,
    #[serde(default, deserialize_with = "null_as_default", rename = "additionalProp1")]
    pub additional: Map<String, JsonValue>,
}

/// 字段显式为 null 时按缺省值处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
