pub mod contact_store;
