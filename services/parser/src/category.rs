//! Dataset categories and what each one means for shaping.
//!
//! One declarative table maps a category to its role candidates, the pivot
//! shape it gets and the reducer applied when grouping by year.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aggregate::Reducer;
use crate::roles::{Role, RoleCandidates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetCategory {
    Emissions,
    Gdp,
    Energy,
    Temperature,
    Disasters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotShape {
    /// Rows by year, one column per selected entity.
    EntityYear,
    /// Rows by year, one column per numeric column.
    YearOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryRules {
    pub category: DatasetCategory,
    pub key: &'static str,
    pub candidates: RoleCandidates,
    pub shape: PivotShape,
    pub reducer: Reducer,
}

const YEAR_ONLY: RoleCandidates = RoleCandidates {
    entity: &[],
    year: &["year"],
    value: &[],
};

pub const CATEGORIES: [CategoryRules; 5] = [
    CategoryRules {
        category: DatasetCategory::Emissions,
        key: "emissions",
        candidates: RoleCandidates {
            entity: &["country"],
            year: &["year"],
            value: &["co2", "co2_emissions", "emissions"],
        },
        shape: PivotShape::EntityYear,
        reducer: Reducer::Sum,
    },
    CategoryRules {
        category: DatasetCategory::Gdp,
        key: "gdp",
        candidates: RoleCandidates {
            entity: &["country"],
            year: &["year"],
            value: &["gdp", "GDP", "value"],
        },
        shape: PivotShape::EntityYear,
        reducer: Reducer::Sum,
    },
    CategoryRules {
        category: DatasetCategory::Energy,
        key: "energy",
        candidates: YEAR_ONLY,
        shape: PivotShape::YearOnly,
        reducer: Reducer::Sum,
    },
    CategoryRules {
        category: DatasetCategory::Temperature,
        key: "temperature",
        candidates: YEAR_ONLY,
        shape: PivotShape::YearOnly,
        reducer: Reducer::Mean,
    },
    CategoryRules {
        category: DatasetCategory::Disasters,
        key: "disasters",
        candidates: YEAR_ONLY,
        shape: PivotShape::YearOnly,
        reducer: Reducer::Sum,
    },
];

impl DatasetCategory {
    /// `CATEGORIES` is laid out in declaration order.
    pub fn rules(self) -> &'static CategoryRules {
        &CATEGORIES[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.rules().key
    }

    pub fn candidates(self) -> &'static RoleCandidates {
        &self.rules().candidates
    }

    pub fn shape(self) -> PivotShape {
        self.rules().shape
    }

    pub fn reducer(self) -> Reducer {
        self.rules().reducer
    }

    /// Roles that must bind for the category to be charted.
    pub fn required_roles(self) -> &'static [Role] {
        match self.shape() {
            PivotShape::EntityYear => &[Role::Entity, Role::Year, Role::Value],
            PivotShape::YearOnly => &[Role::Year],
        }
    }
}

impl fmt::Display for DatasetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown dataset category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for DatasetCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATEGORIES
            .iter()
            .find(|rules| rules.key == s)
            .map(|rules| rules.category)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_an_entry() {
        for category in [
            DatasetCategory::Emissions,
            DatasetCategory::Gdp,
            DatasetCategory::Energy,
            DatasetCategory::Temperature,
            DatasetCategory::Disasters,
        ] {
            assert_eq!(category.rules().category, category);
            assert_eq!(category.key().parse::<DatasetCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_reducer_per_category() {
        assert_eq!(DatasetCategory::Temperature.reducer(), Reducer::Mean);
        assert_eq!(DatasetCategory::Disasters.reducer(), Reducer::Sum);
        assert_eq!(DatasetCategory::Energy.reducer(), Reducer::Sum);
        assert_eq!(DatasetCategory::Emissions.reducer(), Reducer::Sum);
    }

    #[test]
    fn test_shapes_and_required_roles() {
        assert_eq!(DatasetCategory::Gdp.shape(), PivotShape::EntityYear);
        assert_eq!(DatasetCategory::Gdp.required_roles().len(), 3);
        assert_eq!(DatasetCategory::Temperature.shape(), PivotShape::YearOnly);
        assert_eq!(DatasetCategory::Temperature.required_roles(), &[Role::Year]);
    }

    #[test]
    fn test_value_candidates_in_priority_order() {
        assert_eq!(
            DatasetCategory::Emissions.candidates().value,
            &["co2", "co2_emissions", "emissions"]
        );
        assert_eq!(DatasetCategory::Gdp.candidates().value, &["gdp", "GDP", "value"]);
    }

    #[test]
    fn test_unknown_category() {
        let err = "rainfall".parse::<DatasetCategory>().unwrap_err();
        assert_eq!(err.to_string(), "unknown dataset category 'rainfall'");
    }
}
