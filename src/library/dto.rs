use serde::Deserialize;

/// Body of `POST /user/favorites` and `POST /user/watchlist`.
#[derive(Debug, Deserialize)]
pub struct MovieRef {
    #[serde(rename = "movieId")]
    pub movie_id: Option<i64>,
}
