use crate::models::Category;

/// Cost of goods as a fraction of gross amount: `low + U[0,1) * width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBand {
    pub low: f64,
    pub width: f64,
}

impl CostBand {
    pub fn high(&self) -> f64 {
        self.low + self.width
    }

    /// Map a unit draw in [0, 1) onto the band.
    pub fn factor(&self, unit: f64) -> f64 {
        self.low + unit * self.width
    }
}

#[derive(Debug)]
pub struct CatalogEntry {
    pub category: Category,
    pub cost_band: CostBand,
    pub items: &'static [&'static str],
}

/// Fixed product catalog shared by the generator and the SKU lookup.
#[derive(Debug)]
pub struct Catalog {
    entries: &'static [CatalogEntry],
}

static STANDARD: Catalog = Catalog { entries: ENTRIES };

impl Catalog {
    pub fn standard() -> &'static Catalog {
        &STANDARD
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        self.entries
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.iter().map(|e| e.category)
    }

    pub fn items(&self, category: Category) -> &[&'static str] {
        self.entry(category).map(|e| e.items).unwrap_or(&[])
    }

    pub fn cost_band(&self, category: Category) -> Option<CostBand> {
        self.entry(category).map(|e| e.cost_band)
    }

    /// Category a SKU belongs to, or `None` when the SKU is not cataloged.
    pub fn category_of(&self, sku: &str) -> Option<Category> {
        self.entries
            .iter()
            .find(|e| e.items.iter().any(|item| *item == sku))
            .map(|e| e.category)
    }

    /// Total number of items across all categories.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.items.len()).sum()
    }

    fn entry(&self, category: Category) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.category == category)
    }
}

const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        category: Category::Beer,
        cost_band: CostBand { low: 0.35, width: 0.10 },
        items: &[
            "Hemlock", "CURRENT CAN", "GANSETT", "N/A BEER", "Return Beer", "SIX POINT",
            "Vermonter Cider",
        ],
    },
    CatalogEntry {
        category: Category::Cocktails,
        cost_band: CostBand { low: 0.25, width: 0.10 },
        items: &[
            "BEAD & FEATHER", "BLACK MANHATTAN", "CARPETBAGGER", "COCKTAIL OF THE DAY",
            "COCKTAIL SHAKEN", "COCKTAIL STIRRED", "Daiquiri", "Gershwin", "Gimlet",
            "Gin & Sin", "HAITIAN DIVORCE", "HOT DRINX", "Manhattan", "Margarita",
            "Martini Gin", "Martini Vodka", "Negroni", "Old Fashioned", "Open Cocktail",
            "Paper Plane", "Penicillin", "Pineapple Daiq", "pineapple daiquiri",
            "POP-UP COCKTAIL", "Rainy Day Dark And Stormy", "SAZERAC COCKTAIL", "SHOOTER",
            "Soda", "SPRITZ", "TITOS MARTINI", "TONE POLICE",
        ],
    },
    CatalogEntry {
        category: Category::Food,
        cost_band: CostBand { low: 0.40, width: 0.15 },
        items: &[
            "BABA GHANO0USH", "BEEF TARTARE", "BITTER SALAD", "BOQUERONES", "BROWNIE",
            "Burger", "CARROTS", "CAVIAR DOG", "CHARRED BEETS", "CHICKEM KEBAB",
            "CHX SANDWICH", "CROQUETTES", "Doggie", "DUCK RILLETTES", "EXTRA FOCACCIA",
            "Extra Patty", "FALAFEL", "FOCACCIA", "FRENCH FRIES", "Fries", "HANDER STEAK",
            "HUMMUS", "LAMB KABAB", "LEEK TOAST", "MEZE PLATTER", "MEZE PLATTY", "PLATTY",
            "MOUSSE", "MOZZ STICKS", "MUHAMMARA", "NYE TACOS", "OLIVES AND PICKELS",
            "Open Food", "Order note", "Pimento Cheese", "Salad", "SAUSAGE", "SEA TROUT",
            "Smash - Vegan Patty", "STEAK FRITES", "SUNCHOKES", "TOSTADA", "TZATZIKI", "VCC",
        ],
    },
    CatalogEntry {
        category: Category::Spirits,
        cost_band: CostBand { low: 0.30, width: 0.10 },
        items: &[
            "AMARGO VALLET", "Amaro", "Balvenie", "Bourbon", "BW WHEAT", "CAMPARI",
            "CASCUIN TAHONA", "CURRENT CASSIS", "CYNAR", "EL DORADO 12", "ESPOLON", "Fernet",
            "Gin", "Hendricks", "Juice", "Macallan 18", "Makers", "Mezcal", "Michters",
            "MONTENEGRO", "NONINO", "OLD FORESTER 100", "Open Spirit", "Rare Breed",
            "RITTENHOUSE", "Rum", "SAZERAC", "Scotch", "SHOT 4$", "SHOT 5$", "SHOT 6$",
            "SHOT 7$", "SHOT 8$", "SHOT 9$", "Spirit", "SUZE", "Talisker", "Tequila",
            "TEREMANA REPOSADO", "Tesoro", "Titos", "Toki", "TULLY", "Vodka", "Wathen's",
            "ZACAPA",
        ],
    },
    CatalogEntry {
        category: Category::Wine,
        cost_band: CostBand { low: 0.45, width: 0.10 },
        items: &["BTL Fizzy", "GLS Fizzy", "GLS Red", "GLS Rose", "GLS White", "OPEN WINE"],
    },
    CatalogEntry {
        category: Category::NonAlcoholic,
        cost_band: CostBand { low: 0.15, width: 0.10 },
        items: &["Ginger Beer", "Mock Turtleneck", "POP-UP MOCKTAIL"],
    },
    CatalogEntry {
        category: Category::Merch,
        cost_band: CostBand { low: 0.50, width: 0.20 },
        items: &["Candle 2 oz", "Candle 9oz", "Misc", "GIFT CERTIFICATE"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_covers_every_category() {
        let catalog = Catalog::standard();
        let cats: Vec<Category> = catalog.categories().collect();
        assert_eq!(cats, Category::ALL.to_vec());
        for c in Category::ALL {
            assert!(!catalog.items(c).is_empty(), "{c} has no items");
            assert!(catalog.cost_band(c).is_some(), "{c} has no cost band");
        }
        assert_eq!(catalog.len(), 141);
    }

    #[test]
    fn test_category_lookup() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.category_of("Negroni"), Some(Category::Cocktails));
        assert_eq!(catalog.category_of("SAZERAC"), Some(Category::Spirits));
        assert_eq!(catalog.category_of("SAZERAC COCKTAIL"), Some(Category::Cocktails));
        assert_eq!(catalog.category_of("Candle 9oz"), Some(Category::Merch));
        assert_eq!(catalog.category_of("negroni"), None);
        assert_eq!(catalog.category_of("Unknown Special"), None);
    }

    #[test]
    fn test_cost_band_bounds() {
        let band = Catalog::standard().cost_band(Category::Merch).unwrap();
        assert_eq!(band.factor(0.0), 0.50);
        assert!((band.high() - 0.70).abs() < 1e-12);
        assert!(band.factor(0.999) < band.high());
    }

    #[test]
    fn test_custom_catalog() {
        static SMALL: &[CatalogEntry] = &[CatalogEntry {
            category: Category::Wine,
            cost_band: CostBand { low: 0.5, width: 0.0 },
            items: &["House Red"],
        }];
        let catalog = Catalog { entries: SMALL };
        assert_eq!(catalog.len(), 1);
        assert!(catalog.items(Category::Beer).is_empty());
        assert_eq!(catalog.category_of("House Red"), Some(Category::Wine));
    }
}
