//! Resource controllers, in routing order

pub mod albums;
pub mod artists;
pub mod fields;
pub mod playlists;
pub mod tokens;
pub mod tracks;
pub mod users;

use crate::api::Controller;
use crate::state::AppState;

pub fn all(state: &AppState) -> Vec<Box<dyn Controller>> {
    vec![
        tracks::controller(state.clone()),
        albums::controller(state.clone()),
        artists::controller(state.clone()),
        playlists::controller(state.clone()),
        users::controller(state.clone()),
        tokens::controller(state.clone()),
    ]
}
