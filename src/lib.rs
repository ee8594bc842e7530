pub mod access;
pub mod error;
pub mod firestore;
pub mod normalize;
pub mod scope;
pub mod services;
pub mod state;
pub mod types;
pub mod views;
