//! Prompt templates and rendering.
//!
//! Templates use `{name}` placeholders. `{{` and `}}` produce literal braces,
//! and any other brace is copied through unchanged, so SQL or JSON fragments
//! in a template need no escaping.

use crate::config::PipelineConfig;
use crate::error::{ChatError, Result};

/// Built-in template for the SQL generation stage.
pub const SQL_TEMPLATE: &str = r#"
Eres un asistente de consultas SQL en MySQL. Sigue estos pasos:
1. Lee cuidadosamente la pregunta del usuario e identifica qué información específica necesita.
2. Primero, verifica si el dato solicitado existe como una columna en la tabla `usuarios`. Si es así, genera una consulta SQL simple para obtenerlo.
3. Si el usuario menciona un dato de manera general (como "correo electrónico", "edad", "nombre completo"), infiere cuál columna corresponde en la tabla `usuarios`. Por ejemplo, asocia "correo electrónico" con la columna `email`.
4. Si el dato solicitado no está directamente disponible como columna, intenta derivarlo a partir de otros datos. Usa cálculos o combinaciones cuando sea necesario.
5. Si la pregunta implica una verificación, comparación o un filtro, utiliza condiciones en SQL para obtener solo los resultados relevantes.
6. Si la consulta pide una lista de resultados (por ejemplo, "todos los nombres"), devuelve todos los registros relevantes, no solo el primero.
7. Asegúrate de que la consulta SQL sea precisa y devuelva únicamente los datos necesarios para responder la pregunta.
8. Escribe la consulta en una sola línea y termínala con punto y coma.
9. No incluyas explicaciones adicionales ni información fuera de la consulta SQL.

Pregunta del usuario: {question}
"#;

/// Built-in template for the summary stage.
pub const SUMMARY_TEMPLATE: &str = r#"
Eres un asistente que explica en español los resultados de consultas a una base de datos.

Pregunta del usuario: {question}

Datos obtenidos de la base de datos:
{data}

Responde a la pregunta de forma breve y clara usando únicamente los datos obtenidos. Si no hay filas, indica que no se encontraron resultados.
"#;

/// Bindings accepted by the SQL generation template.
const SQL_BINDINGS: &[&str] = &["question"];

/// Bindings accepted by the summary template.
const SUMMARY_BINDINGS: &[&str] = &["question", "data"];

/// Renders `template`, replacing each `{name}` with its binding.
///
/// Bound values are inserted as-is and never scanned again, so a question
/// containing `{data}` stays literal. Fails with `MissingBinding` when a
/// placeholder has no binding.
pub fn render(template: &str, bindings: &[(&str, &str)]) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        output.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            output.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if let Some((name, after)) = placeholder_at(tail) {
            let value = bindings
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .ok_or_else(|| ChatError::missing_binding(name))?;
            output.push_str(value);
            rest = after;
            continue;
        }

        output.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    output.push_str(rest);
    Ok(output)
}

/// Returns the distinct placeholder names in `template`, in order of first use.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            rest = &tail[2..];
        } else if let Some((name, after)) = placeholder_at(tail) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
            rest = after;
        } else {
            rest = &tail[1..];
        }
    }

    names
}

/// Parses `{identifier}` at the start of `text`, returning the name and the
/// text after the closing brace.
fn placeholder_at(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix('{')?;
    let end = body.find('}')?;
    let name = &body[..end];

    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    Some((name, &body[end + 1..]))
}

/// The pair of templates used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    sql: String,
    summary: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            sql: SQL_TEMPLATE.to_string(),
            summary: SUMMARY_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Builds the templates, applying and validating any configured overrides.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let mut templates = Self::default();

        if let Some(sql) = &config.sql_template {
            validate("sql_template", sql, SQL_BINDINGS)?;
            templates.sql = sql.clone();
        }

        if let Some(summary) = &config.summary_template {
            validate("summary_template", summary, SUMMARY_BINDINGS)?;
            templates.summary = summary.clone();
        }

        Ok(templates)
    }

    /// Renders the SQL generation prompt.
    pub fn render_sql(&self, question: &str) -> Result<String> {
        render(&self.sql, &[("question", question)])
    }

    /// Renders the summary prompt with the formatted result table.
    pub fn render_summary(&self, question: &str, data: &str) -> Result<String> {
        render(&self.summary, &[("question", question), ("data", data)])
    }
}

fn validate(key: &str, template: &str, allowed: &[&str]) -> Result<()> {
    let unknown: Vec<String> = placeholders(template)
        .into_iter()
        .filter(|name| !allowed.contains(&name.as_str()))
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }

    Err(ChatError::config(format!(
        "pipeline.{} uses unknown placeholder(s): {}. Allowed: {}",
        key,
        unknown
            .iter()
            .map(|name| format!("{{{name}}}"))
            .collect::<Vec<_>>()
            .join(", "),
        allowed
            .iter()
            .map(|name| format!("{{{name}}}"))
            .collect::<Vec<_>>()
            .join(", ")
    )))
}
