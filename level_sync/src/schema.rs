//! Diesel table definitions for the document store.
#![allow(missing_docs)]

diesel::table! {
    documents (id) {
        id -> Nullable<Integer>,
        collection -> Text,
        symbol -> Text,
        today_date -> Text,
        doc -> Text,
    }
}
