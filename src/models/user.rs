#[derive(Debug, Clone)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    pub created_at: String,
}

impl User {
    pub fn new(username: String) -> Self {
        Self {
            id: None,
            username,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
