//! Category display formatting

use crate::models::Category;

/// Format categories as a table, income first
pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n\nRun 'ledger category defaults' to create the starter set."
            .to_string();
    }

    let name_width = categories
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<width$}  {:<8}  {:<8}  {:<12}  {}\n",
        "Category",
        "Type",
        "Color",
        "ID",
        "Description",
        width = name_width
    ));
    output.push_str(&format!(
        "{:-<width$}  {:-<8}  {:-<8}  {:-<12}  {:-<11}\n",
        "",
        "",
        "",
        "",
        "",
        width = name_width
    ));

    for category in categories {
        output.push_str(&format!(
            "{:<width$}  {:<8}  {:<8}  {:<12}  {}\n",
            category.name,
            category.category_type.to_string(),
            category.color,
            category.id.to_string(),
            category.description,
            width = name_width
        ));
    }

    output
}

/// Format category details
pub fn format_category_details(category: &Category, usage: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("Category: {}\n", category.name));
    output.push_str(&format!("  ID:          {}\n", category.id));
    output.push_str(&format!("  Type:        {}\n", category.category_type));
    output.push_str(&format!("  Color:       {}\n", category.color));
    output.push_str(&format!("  Icon:        {}\n", category.icon));
    if !category.description.is_empty() {
        output.push_str(&format!("  Description: {}\n", category.description));
    }
    output.push_str(&format!("  Operations:  {}\n", usage));

    output
}
