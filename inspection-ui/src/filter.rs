use inspection_core::{BucketEntry, CategorizedEvents, Category};

/// Planner list filter: an optional category chip plus a free-text school query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannerFilter {
    pub category: Option<Category>,
    pub query: String,
}

impl PlannerFilter {
    pub fn toggle(&mut self, category: Category) {
        self.category = match self.category {
            Some(current) if current == category => None,
            _ => Some(category),
        };
    }
}

/// Entries to list, bucket by bucket in the fixed category order.
pub fn visible_entries<'a>(
    categories: &'a CategorizedEvents,
    filter: &PlannerFilter,
) -> Vec<(Category, &'a BucketEntry)> {
    let query = filter.query.trim().to_lowercase();
    Category::ALL
        .into_iter()
        .filter(|category| filter.category.map_or(true, |selected| selected == *category))
        .flat_map(|category| {
            categories
                .bucket(category)
                .iter()
                .map(move |entry| (category, entry))
        })
        .filter(|(_, entry)| query.is_empty() || entry.org_unit_name().to_lowercase().contains(&query))
        .collect()
}
