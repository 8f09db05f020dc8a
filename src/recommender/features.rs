use crate::models::Product;

/// Derives the text that represents a product in the vector space.
#[derive(Debug, Clone, Copy)]
pub struct FeatureTextBuilder {
    include_description: bool,
}

impl FeatureTextBuilder {
    pub fn new(include_description: bool) -> Self {
        Self {
            include_description,
        }
    }

    /// `name category[ description]`; absent fields contribute an empty string.
    pub fn build(&self, product: &Product) -> String {
        let mut text = String::with_capacity(
            product.name.len()
                + product.category.len()
                + product.description.as_deref().map_or(0, str::len)
                + 2,
        );
        text.push_str(&product.name);
        text.push(' ');
        text.push_str(&product.category);

        if self.include_description {
            text.push(' ');
            text.push_str(product.description.as_deref().unwrap_or(""));
        }

        text
    }

    pub fn build_all(&self, products: &[Product]) -> Vec<String> {
        products.iter().map(|product| self.build(product)).collect()
    }
}

impl Default for FeatureTextBuilder {
    fn default() -> Self {
        Self::new(true)
    }
}
