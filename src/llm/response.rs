//! 模型输出的三段式解析：直接解码、轻量修复、激进重建
//!
//! Model output is messy: Markdown fences, prose around the JSON, truncated
//! tails. Parsing walks the stages in order and reports a positioned error
//! only after all of them fail. Decoded data is then normalized in place;
//! absent blocks are never invented.

use serde_json::Value;

use crate::constants::parser::ERROR_PREVIEW_LENGTH;
use crate::error::{FitError, Result};
use crate::llm::EnhancedWorkoutResponse;
use crate::workout::{BlockType, WorkoutBlock, WorkoutExercise};

/// Characters shown on each side of the decoder-reported position.
const EXCERPT_RADIUS: usize = 100;

const DEFAULT_PERSONALIZED_MESSAGE: &str = "Great workout ahead! Let's get started!";

/// JSON 合法但语义不符的失败直接终止，语法失败才进入修复阶段
enum DecodeFailure {
    Syntax(serde_json::Error),
    Terminal(FitError),
}

/// Parses a raw model completion into a normalized workout response.
///
/// Stage 1 decodes the fence-stripped JSON span directly. Stage 2 applies
/// light structural repair to that span. Stage 3 rebuilds the span from the
/// raw content and repairs again. A response without a `workout` object or
/// with an out-of-vocabulary token fails immediately regardless of the
/// stage that produced it.
///
/// # Errors
/// [`FitError::Parse`] carrying the first decoder's position (as a character
/// offset) and a bounded excerpt when every stage fails.
pub fn parse_workout_response(raw: &str, model_used: &str) -> Result<EnhancedWorkoutResponse> {
    let candidate = extract_json(raw)?;

    let syntax_error = match decode(&candidate) {
        Ok(response) => return Ok(finalize(response, model_used)),
        Err(DecodeFailure::Terminal(err)) => return Err(err),
        Err(DecodeFailure::Syntax(err)) => err,
    };

    tracing::debug!(error = %syntax_error, "direct JSON decode failed, repairing");

    let repaired = repair_json(&candidate);
    match decode(&repaired) {
        Ok(response) => return Ok(finalize(response, model_used)),
        Err(DecodeFailure::Terminal(err)) => return Err(err),
        Err(DecodeFailure::Syntax(err)) => {
            tracing::debug!(error = %err, "light repair not decodable, rebuilding from raw");
        }
    }

    let rebuilt = repair_json(&aggressive_clean(raw));
    match decode(&rebuilt) {
        Ok(response) => Ok(finalize(response, model_used)),
        Err(DecodeFailure::Terminal(err)) => Err(err),
        Err(DecodeFailure::Syntax(_)) => Err(syntax_parse_error(&candidate, &syntax_error)),
    }
}

/// 从模型输出中截取 JSON 候选段（剥掉 Markdown 代码围栏）
///
/// Keeps the tail open when no closing brace exists, so truncated
/// responses still reach the repair stages.
fn extract_json(raw: &str) -> Result<String> {
    let stripped = raw.replace("```json", "").replace("```", "");
    let cleaned = stripped.trim();

    let start = cleaned.find('{').ok_or_else(|| FitError::Parse {
        message: rust_i18n::t!("parse.no_json").to_string(),
        position: None,
        excerpt: preview(cleaned),
    })?;

    let candidate = match cleaned.rfind('}') {
        Some(end) if end > start => &cleaned[start..=end],
        _ => &cleaned[start..],
    };
    Ok(candidate.trim().to_string())
}

fn decode(candidate: &str) -> std::result::Result<EnhancedWorkoutResponse, DecodeFailure> {
    let value: Value = serde_json::from_str(candidate).map_err(DecodeFailure::Syntax)?;

    if value.get("workout").is_none() {
        return Err(DecodeFailure::Terminal(FitError::Parse {
            message: rust_i18n::t!("parse.missing_workout").to_string(),
            position: None,
            excerpt: preview(candidate),
        }));
    }

    let response: EnhancedWorkoutResponse =
        serde_json::from_value(value).map_err(|err| {
            DecodeFailure::Terminal(FitError::Parse {
                message: rust_i18n::t!("parse.decode_failed", error = err.to_string()).to_string(),
                position: None,
                excerpt: preview(candidate),
            })
        })?;

    if response.workout.title.trim().is_empty() {
        return Err(DecodeFailure::Terminal(FitError::Parse {
            message: rust_i18n::t!("parse.missing_title").to_string(),
            position: None,
            excerpt: preview(candidate),
        }));
    }

    Ok(response)
}

fn finalize(mut response: EnhancedWorkoutResponse, model_used: &str) -> EnhancedWorkoutResponse {
    normalize_response(&mut response);
    response.model_used = model_used.to_string();
    response
}

/// Light structural repair for almost-valid JSON.
///
/// 三步：补全悬挂字符串、给未闭合的括号补配对、去掉多余逗号。
/// 只做词法层面的修补，不理解 schema。
fn repair_json(candidate: &str) -> String {
    let text = close_dangling_string(candidate.trim());
    let text = balance_delimiters(&text);
    strip_stray_commas(&text)
}

/// 响应在字符串中间被截断时，回退到引号起点并补成空串
fn close_dangling_string(text: &str) -> String {
    let mut in_string = false;
    let mut escaped = false;
    let mut open_quote = 0usize;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
            open_quote = index;
        }
    }

    if in_string {
        let mut repaired = text[..open_quote].to_string();
        repaired.push_str("\"\"");
        repaired
    } else {
        text.to_string()
    }
}

/// Appends closers for unmatched `{` and `[`. Append-only: surplus closers
/// are left for [`aggressive_clean`] to cut away.
fn balance_delimiters(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => stack.push(ch),
            '}' => {
                if stack.last() == Some(&'{') {
                    stack.pop();
                }
            }
            ']' => {
                if stack.last() == Some(&'[') {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    if stack.is_empty() {
        return text.to_string();
    }
    let mut repaired = text.to_string();
    for opener in stack.into_iter().rev() {
        repaired.push(if opener == '[' { ']' } else { '}' });
    }
    repaired
}

/// 去掉修补后常见的多余逗号（`,]`、`,}`、`,,`、`[,`）
fn strip_stray_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut prev_significant: Option<char> = None;

    for (index, &ch) in chars.iter().enumerate() {
        if in_string {
            result.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
            result.push(ch);
            prev_significant = Some(ch);
            continue;
        }
        if ch == ',' {
            let next = chars[index + 1..]
                .iter()
                .copied()
                .find(|c| !c.is_whitespace());
            let stray = matches!(next, Some('}') | Some(']') | Some(',') | None)
                || prev_significant == Some('[');
            if stray {
                continue;
            }
        }
        result.push(ch);
        if !ch.is_whitespace() {
            prev_significant = Some(ch);
        }
    }
    result
}

/// 激进重建：丢掉首个 `{` 之前的一切，截断到最后一个配平点
fn aggressive_clean(raw: &str) -> String {
    let stripped = raw.replace("```json", "").replace("```", "");
    let Some(start) = stripped.find('{') else {
        return stripped.trim().to_string();
    };
    let tail = &stripped[start..];

    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0u32;
    let mut last_balanced: Option<usize> = None;

    for (index, ch) in tail.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        last_balanced = Some(index + ch.len_utf8());
                    }
                }
            }
            _ => {}
        }
    }

    match last_balanced {
        Some(end) => tail[..end].to_string(),
        None => tail.to_string(),
    }
}

/// serde_json 的行列定位换算成字符偏移
fn error_offset(text: &str, err: &serde_json::Error) -> Option<usize> {
    let (line, column) = (err.line(), err.column());
    if line == 0 || column == 0 {
        return None;
    }

    let mut byte_offset = 0usize;
    for (index, line_text) in text.split('\n').enumerate() {
        if index + 1 == line {
            byte_offset += column.saturating_sub(1).min(line_text.len());
            while byte_offset > 0 && !text.is_char_boundary(byte_offset) {
                byte_offset -= 1;
            }
            return Some(text[..byte_offset].chars().count());
        }
        byte_offset += line_text.len() + 1;
    }
    None
}

fn excerpt_around(text: &str, char_offset: usize) -> String {
    let start = char_offset.saturating_sub(EXCERPT_RADIUS);
    text.chars().skip(start).take(EXCERPT_RADIUS * 2).collect()
}

fn preview(text: &str) -> String {
    text.chars().take(ERROR_PREVIEW_LENGTH).collect()
}

fn syntax_parse_error(candidate: &str, err: &serde_json::Error) -> FitError {
    let position = error_offset(candidate, err);
    let excerpt = match position {
        Some(offset) => excerpt_around(candidate, offset),
        None => preview(candidate),
    };
    FitError::Parse {
        message: rust_i18n::t!("parse.decode_failed", error = err.to_string()).to_string(),
        position,
        excerpt,
    }
}

/// Fills ids and names, forces edge-block types, and clamps coaching
/// targets. 幂等：规范化过的数据再跑一遍不会变化。
pub(crate) fn normalize_response(response: &mut EnhancedWorkoutResponse) {
    let workout = &mut response.workout;

    if workout.id.is_empty() {
        workout.id = "workout".to_string();
    }

    normalize_edge_block(&mut workout.warmup, "warmup", BlockType::Warmup);
    normalize_edge_block(&mut workout.cooldown, "cooldown", BlockType::Cooldown);

    for (block_index, block) in workout.blocks.iter_mut().enumerate() {
        let ordinal = block_index + 1;
        if block.id.is_empty() {
            block.id = format!("block-{ordinal}");
        }
        if block.name.is_empty() {
            block.name = "Workout Block".to_string();
        }
        for (exercise_index, exercise) in block.exercises.iter_mut().enumerate() {
            normalize_exercise(
                exercise,
                &format!("exercise-{ordinal}-{}", exercise_index + 1),
            );
        }
    }

    if response.personalized_message.is_empty() {
        response.personalized_message = DEFAULT_PERSONALIZED_MESSAGE.to_string();
    }
}

fn normalize_edge_block(block: &mut WorkoutBlock, id: &str, block_type: BlockType) {
    if block.id.is_empty() {
        block.id = id.to_string();
    }
    block.block_type = block_type;
    for (index, exercise) in block.exercises.iter_mut().enumerate() {
        normalize_exercise(exercise, &format!("exercise-{id}-{}", index + 1));
    }
}

fn normalize_exercise(exercise: &mut WorkoutExercise, fallback_id: &str) {
    if exercise.id.as_deref().map_or(true, str::is_empty) {
        exercise.id = Some(fallback_id.to_string());
    }
    if exercise.name.is_empty() {
        exercise.name = "Unknown Exercise".to_string();
    }
    if let Some(rpe) = exercise.target_rpe {
        exercise.target_rpe = Some(rpe.clamp(1, 10));
    }
    if let Some(rir) = exercise.target_rir {
        exercise.target_rir = Some(rir.min(5));
    }
}
