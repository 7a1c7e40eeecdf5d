use std::{fs::File, io::Read, path::Path};

use rand::{Rng, seq::SliceRandom};
use tracing::{debug, error};

use crate::{errors::CatalogError, product::ProductEntry};

/// Product shown in the header banner when present in the catalog
pub const HEADER_PRODUCT_TITLE: &str = "Perfect Goldfish Bowl";

fn parse_products<R: Read>(reader: R) -> Result<Vec<ProductEntry>, CatalogError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Reads a JSON array of products. A catalog that can't be read or parsed
/// is logged and treated as having no products.
pub fn read_products_from_reader<R: Read>(reader: R) -> Vec<ProductEntry> {
    match parse_products(reader) {
        Ok(products) => {
            debug!("Loaded {} products", products.len());
            products
        }
        Err(err) => {
            error!("Error reading JSON product list: {}", err);
            Vec::new()
        }
    }
}

fn open_catalog(path: &Path) -> Result<File, CatalogError> {
    Ok(File::open(path)?)
}

pub fn read_products(path: impl AsRef<Path>) -> Vec<ProductEntry> {
    let path = path.as_ref();

    match open_catalog(path) {
        Ok(file) => read_products_from_reader(file),
        Err(err) => {
            error!("Error opening product list {}: {}", path.display(), err);
            Vec::new()
        }
    }
}

pub fn header_product(products: &[ProductEntry]) -> Result<&ProductEntry, CatalogError> {
    let Some(first) = products.first() else {
        return Err(CatalogError::Empty);
    };

    Ok(products
        .iter()
        .find(|product| product.title == HEADER_PRODUCT_TITLE)
        .unwrap_or(first))
}

pub fn shuffle_products<R: Rng + ?Sized>(products: &mut [ProductEntry], rng: &mut R) {
    products.shuffle(rng);
}
