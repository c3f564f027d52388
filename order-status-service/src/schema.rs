diesel::table! {
    order_statuses (id) {
        id -> Varchar,
        order_id -> Varchar,
        status -> Varchar,
        remark -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    order_status_logs (id) {
        id -> Uuid,
        order_id -> Varchar,
        status -> Varchar,
        remark -> Text,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    order_statuses,
    order_status_logs,
);
