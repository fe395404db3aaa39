use serde_json::Value;

/// Contención JSON con las reglas de `jsonb @> jsonb`:
/// - objeto contiene objeto si cada clave del patrón está y su valor se contiene;
/// - array contiene array si cada elemento del patrón se contiene en alguno;
/// - array contiene un escalar si lo tiene como elemento;
/// - el resto, igualdad.
pub fn json_contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Object(have), Value::Object(want)) => {
            want.iter()
                .all(|(k, w)| have.get(k).is_some_and(|h| json_contains(h, w)))
        }
        (Value::Array(have), Value::Array(want)) => want.iter().all(|w| have.iter().any(|h| json_contains(h, w))),
        (Value::Array(have), scalar) if !scalar.is_object() => have.iter().any(|h| h == scalar),
        (h, w) => h == w,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_field_match() {
        let doc = json!({"name": "s1", "processor_id": "a"});
        assert!(json_contains(&doc, &json!({"processor_id": "a"})));
        assert!(!json_contains(&doc, &json!({"processor_id": "b"})));
        assert!(!json_contains(&doc, &json!({"missing": "a"})));
    }

    #[test]
    fn list_field_contains_element() {
        let doc = json!({"step_ids": ["a", "b", "c"]});
        assert!(json_contains(&doc, &json!({"step_ids": ["b"]})));
        assert!(json_contains(&doc, &json!({"step_ids": []})));
        assert!(!json_contains(&doc, &json!({"step_ids": ["z"]})));
    }

    #[test]
    fn tagged_list_matches_kind_and_id() {
        let doc = json!({"entity_ids": [{"kind": "Schema", "id": "a"}, {"kind": "Delivery", "id": "b"}]});
        assert!(json_contains(&doc, &json!({"entity_ids": [{"kind": "Schema", "id": "a"}]})));
        assert!(!json_contains(&doc, &json!({"entity_ids": [{"kind": "Address", "id": "a"}]})));
    }

    #[test]
    fn array_contains_primitive() {
        assert!(json_contains(&json!(["a", 1]), &json!("a")));
        assert!(!json_contains(&json!(["a", 1]), &json!(2)));
    }
}
