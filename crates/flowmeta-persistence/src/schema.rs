//! Esquema Diesel (mantenido a mano). Reemplazable con `diesel print-schema`.

diesel::table! {
    entity_documents (id) {
        seq -> BigInt,
        kind -> Text,
        id -> Uuid,
        composite_key -> Text,
        body -> Jsonb,
    }
}

diesel::table! {
    change_log (seq) {
        seq -> BigInt,
        kind -> Text,
        entity_id -> Uuid,
        change_type -> Text,
        actor -> Text,
        ts -> Timestamptz,
        payload -> Jsonb,
    }
}

diesel::allow_tables_to_appear_in_same_query!(entity_documents, change_log,);
