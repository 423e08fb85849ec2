//! Product selection against the configured catalog.

use super::error::CampaignError;
use super::model::Product;
use crate::core::Config;

/// Parse `category:name` specs and check each against the catalog.
///
/// Duplicate products are dropped, keeping the first occurrence.
pub fn resolve_products(config: &Config, specs: &[String]) -> Result<Vec<Product>, CampaignError> {
    let mut products: Vec<Product> = Vec::with_capacity(specs.len());

    for spec in specs {
        let product = Product::parse(spec)?;
        let category = config.find_product(&product.category, &product.name).ok_or_else(|| {
            CampaignError::InvalidInput(format!(
                "'{}' is not in the catalog (see `mailforge products`)",
                spec
            ))
        })?;

        if products.contains(&product) {
            tracing::debug!(product = %product.name, "Skipping duplicate product");
            continue;
        }
        products.push(Product::new(product.name, category.category.clone()));
    }

    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_known_products() {
        let products =
            resolve_products(&Config::default(), &specs(&["PHONES:Galaxy_S24", "tv:OLED_TV"]))
                .unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].category, "phones");
        assert_eq!(products[1].name, "OLED_TV");
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        let err = resolve_products(&Config::default(), &specs(&["phones:Pixel_9"])).unwrap_err();
        assert!(matches!(err, CampaignError::InvalidInput(_)));

        assert!(resolve_products(&Config::default(), &specs(&["laptops:Galaxy_S24"])).is_err());
    }

    #[test]
    fn test_resolve_drops_duplicates() {
        let products = resolve_products(
            &Config::default(),
            &specs(&["watches:Watch7", "watches:Watch7"]),
        )
        .unwrap();
        assert_eq!(products.len(), 1);
    }
}
