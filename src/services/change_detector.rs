use serde_json::{Map, Value};

use crate::models::Request;

/// A field-level delta before the acting identity and timestamp are
/// stamped on by the log service.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDraft {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Sub-fields of `saveOffer` that participate in diffing. Anything else on
/// the offer snapshot is ignored.
const OFFER_FIELDS: &[&str] = &[
    "id",
    "title",
    "dateOffered",
    "dateAccepted",
    "dateDeclined",
    "dateConfirmed",
];

/// How a top-level request field is diffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// Diffed per sub-field, emitting `customerInfo.<name>` changes.
    CustomerInfo,
    /// Diffed per allow-listed sub-field, emitting `saveOffer.<name>`.
    SaveOffer,
    /// Identity and bookkeeping fields; never diffed.
    Identity,
    /// Compared as a whole value. Deliberately no recursive diff here:
    /// nested values other than the two cases above compare structurally
    /// as single units.
    Scalar,
}

fn classify(field: &str) -> FieldKind {
    match field {
        "customerInfo" => FieldKind::CustomerInfo,
        "saveOffer" => FieldKind::SaveOffer,
        "id" | "version" | "logId" | "proxyTenantId" | "providerTenantId" => FieldKind::Identity,
        _ => FieldKind::Scalar,
    }
}

/// Compare a request against a partial update and produce one delta per
/// field whose value would change. Pure: no side effects, deterministic,
/// output order follows patch key order. Absent fields are skipped; an
/// empty patch produces no deltas.
pub fn detect_changes(current: &Request, patch: &Map<String, Value>) -> Vec<ChangeDraft> {
    let current_doc = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let mut changes = Vec::new();

    for (field, patch_value) in patch {
        match classify(field) {
            FieldKind::Identity => {}
            FieldKind::CustomerInfo => {
                diff_customer_info(&current_doc, patch_value, &mut changes);
            }
            FieldKind::SaveOffer => {
                diff_save_offer(&current_doc, patch_value, &mut changes);
            }
            FieldKind::Scalar => {
                let old_value = current_doc.get(field).cloned().unwrap_or(Value::Null);
                if &old_value != patch_value {
                    changes.push(ChangeDraft {
                        field: field.clone(),
                        old_value,
                        new_value: patch_value.clone(),
                    });
                }
            }
        }
    }

    changes
}

fn diff_customer_info(current_doc: &Map<String, Value>, patch_value: &Value, out: &mut Vec<ChangeDraft>) {
    static EMPTY: once_cell::sync::Lazy<Map<String, Value>> = once_cell::sync::Lazy::new(Map::new);

    let current_info = current_doc
        .get("customerInfo")
        .and_then(Value::as_object)
        .unwrap_or(&EMPTY);
    let patch_info = patch_value.as_object().unwrap_or(&EMPTY);

    for (sub_field, new_value) in patch_info {
        let old_value = current_info.get(sub_field).cloned().unwrap_or(Value::Null);
        if &old_value != new_value {
            out.push(ChangeDraft {
                field: format!("customerInfo.{sub_field}"),
                old_value,
                new_value: new_value.clone(),
            });
        }
    }
}

fn diff_save_offer(current_doc: &Map<String, Value>, patch_value: &Value, out: &mut Vec<ChangeDraft>) {
    static EMPTY: once_cell::sync::Lazy<Map<String, Value>> = once_cell::sync::Lazy::new(Map::new);

    let current_offer = current_doc
        .get("saveOffer")
        .and_then(Value::as_object)
        .unwrap_or(&EMPTY);
    let patch_offer = patch_value.as_object().unwrap_or(&EMPTY);

    // Only sub-fields present in the patch participate; the allow-list
    // fixes their emission order.
    for sub_field in OFFER_FIELDS {
        let Some(new_value) = patch_offer.get(*sub_field) else {
            continue;
        };
        let old_value = current_offer.get(*sub_field).cloned().unwrap_or(Value::Null);
        if &old_value != new_value {
            out.push(ChangeDraft {
                field: format!("saveOffer.{sub_field}"),
                old_value,
                new_value: new_value.clone(),
            });
        }
    }
}
