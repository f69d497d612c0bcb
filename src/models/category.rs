pub const DEFAULT_CATEGORY_COLOR: &str = "#6B7280";

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Option<i64>,
    /// `None` for system categories shared by every user.
    pub user_id: Option<i64>,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub is_system: bool,
    pub is_active: bool,
}

impl Category {
    pub fn new(user_id: i64, name: String) -> Self {
        Self {
            id: None,
            user_id: Some(user_id),
            name,
            color: DEFAULT_CATEGORY_COLOR.to_string(),
            icon: String::new(),
            is_system: false,
            is_active: true,
        }
    }

    pub fn system(name: String) -> Self {
        Self {
            id: None,
            user_id: None,
            name,
            color: DEFAULT_CATEGORY_COLOR.to_string(),
            icon: String::new(),
            is_system: true,
            is_active: true,
        }
    }

    /// A user may reference system categories and their own ones.
    pub fn usable_by(&self, user_id: i64) -> bool {
        self.is_active && self.user_id.map_or(true, |owner| owner == user_id)
    }

    /// Find a category by name (case-insensitive) in a slice.
    pub fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
        let lower = name.to_lowercase();
        categories.iter().find(|c| c.name.to_lowercase() == lower)
    }

    /// Find a category by ID in a slice.
    pub fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == Some(id))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
