use serde::{Deserialize, Serialize};

/// A single menu item, owned by exactly one category at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Relative asset path or absolute URL
    #[serde(default)]
    pub image: String,
    /// Owning category id
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A menu section; dish order is display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub dishes: Vec<Dish>,
}

/// Partial dish update. `None` leaves a field unchanged; `tags: Some(None)`
/// clears the tag list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_some"
    )]
    pub tags: Option<Option<Vec<String>>>,
}

/// Partial category update; the dish list is never patched this way
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Catalog plus the transient flags surfaced to the UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogState {
    pub categories: Vec<Category>,
    /// Initial fetch in flight
    pub is_loading: bool,
    /// A write to the remote store is in flight
    pub is_syncing: bool,
    /// Initial load completed once
    pub is_initialized: bool,
}

// Distinguishes an explicit `null` from a missing field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl Dish {
    /// Apply a patch in place. The caller handles re-parenting when the
    /// category changes.
    pub fn apply(&mut self, patch: &DishPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(image) = &patch.image {
            self.image = image.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone().filter(|t| !t.is_empty());
        }
    }
}

impl Category {
    pub fn apply(&mut self, patch: &CategoryPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(icon) = &patch.icon {
            self.icon = icon.clone();
        }
    }
}

impl DishPatch {
    pub fn is_empty(&self) -> bool {
        self == &DishPatch::default()
    }
}

impl CatalogState {
    pub fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            categories,
            ..Self::default()
        }
    }

    pub fn category(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    pub fn category_mut(&mut self, category_id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id == category_id)
    }

    /// Linear scan over every category; dishes are not globally indexed
    pub fn find_dish(&self, dish_id: &str) -> Option<(usize, usize)> {
        self.categories.iter().enumerate().find_map(|(ci, category)| {
            category
                .dishes
                .iter()
                .position(|d| d.id == dish_id)
                .map(|di| (ci, di))
        })
    }

    pub fn dish(&self, dish_id: &str) -> Option<&Dish> {
        self.find_dish(dish_id)
            .map(|(ci, di)| &self.categories[ci].dishes[di])
    }

    pub fn all_dishes(&self) -> Vec<Dish> {
        self.categories
            .iter()
            .flat_map(|c| c.dishes.iter().cloned())
            .collect()
    }
}
