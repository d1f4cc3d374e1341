use std::rc::Rc;

use futures::FutureExt;
use oblast_map_core::config::{QUIZ_DATA_PATH, VECTOR_MAP_PATH};
use oblast_map_core::loader::{AssetLoader, FetchError, FetchFuture};
use oblast_map_core::QuizBook;

thread_local! {
    static VECTOR_MAP: Rc<AssetLoader> =
        Rc::new(AssetLoader::new(VECTOR_MAP_PATH, || fetch_text(VECTOR_MAP_PATH)));
    static QUIZ_DATA: Rc<AssetLoader> =
        Rc::new(AssetLoader::new(QUIZ_DATA_PATH, || fetch_text(QUIZ_DATA_PATH)));
}

fn fetch_text(path: &'static str) -> FetchFuture {
    async move {
        let resp = gloo_net::http::Request::get(path)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if !resp.ok() {
            return Err(FetchError::Status(resp.status()));
        }
        resp.text()
            .await
            .map_err(|e| FetchError::NotText(e.to_string()))
    }
    .boxed_local()
}

/// Map markup, fetched at most once per page.
pub async fn vector_map() -> Result<Rc<str>, FetchError> {
    let loader = VECTOR_MAP.with(Rc::clone);
    loader.load().await
}

/// Region descriptions and questions. The body is fetched once; each call
/// parses its own copy.
pub async fn quiz_book() -> Result<QuizBook, String> {
    let loader = QUIZ_DATA.with(Rc::clone);
    let body = loader.load().await.map_err(|e| e.to_string())?;
    QuizBook::from_json(&body).map_err(|e| format!("quiz data is malformed: {e}"))
}
