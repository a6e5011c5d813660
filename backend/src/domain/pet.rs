//! Pet profiles owned by accounts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AccountId, PetId};

pub const PET_NAME_MAX: usize = 64;
pub const PET_AGE_MAX: u16 = 60;
pub const PET_WEIGHT_MAX_KG: f64 = 500.0;

/// Biological sex recorded for a pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PetGender {
    Male,
    Female,
}

impl PetGender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Validation errors for pet profiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PetValidationError {
    EmptyName,
    NameTooLong { max: usize },
    EmptySpecies,
    AgeOutOfRange { max: u16 },
    WeightOutOfRange { max: f64 },
}

impl PetValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::NameTooLong { .. } => "pet.name",
            Self::EmptySpecies => "pet.type",
            Self::AgeOutOfRange { .. } => "pet.age",
            Self::WeightOutOfRange { .. } => "pet.weight",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::EmptySpecies => "missing_field",
            Self::NameTooLong { .. } => "too_long",
            Self::AgeOutOfRange { .. } | Self::WeightOutOfRange { .. } => "out_of_range",
        }
    }
}

impl fmt::Display for PetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "pet name must not be empty"),
            Self::NameTooLong { max } => write!(f, "pet name must be at most {max} characters"),
            Self::EmptySpecies => write!(f, "pet type must not be empty"),
            Self::AgeOutOfRange { max } => write!(f, "pet age must be between 0 and {max}"),
            Self::WeightOutOfRange { max } => {
                write!(f, "pet weight must be greater than 0 and at most {max} kg")
            }
        }
    }
}

impl std::error::Error for PetValidationError {}

/// Unvalidated pet fields as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetProfileDraft {
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age_years: Option<u16>,
    pub gender: Option<PetGender>,
    pub is_neutered: bool,
    pub weight_kg: Option<f64>,
}

/// Validated descriptive fields of a pet.
///
/// ## Invariants
/// - `name` and `species` are trimmed and non-empty.
/// - `age_years <= PET_AGE_MAX`; `0 < weight_kg <= PET_WEIGHT_MAX_KG`.
/// - Blank breeds are stored as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PetProfile {
    name: String,
    species: String,
    breed: Option<String>,
    age_years: Option<u16>,
    gender: Option<PetGender>,
    is_neutered: bool,
    weight_kg: Option<f64>,
}

impl PetProfile {
    /// Validate a draft into a profile.
    ///
    /// # Examples
    /// ```
    /// use vetconsult::domain::{PetProfile, PetProfileDraft};
    ///
    /// let profile = PetProfile::try_new(PetProfileDraft {
    ///     name: "Milo".into(),
    ///     species: "cat".into(),
    ///     breed: Some("  ".into()),
    ///     ..PetProfileDraft::default()
    /// })
    /// .expect("valid profile");
    /// assert_eq!(profile.breed(), None);
    /// ```
    pub fn try_new(draft: PetProfileDraft) -> Result<Self, PetValidationError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(PetValidationError::EmptyName);
        }
        if name.chars().count() > PET_NAME_MAX {
            return Err(PetValidationError::NameTooLong { max: PET_NAME_MAX });
        }
        let species = draft.species.trim();
        if species.is_empty() {
            return Err(PetValidationError::EmptySpecies);
        }
        if draft.age_years.is_some_and(|age| age > PET_AGE_MAX) {
            return Err(PetValidationError::AgeOutOfRange { max: PET_AGE_MAX });
        }
        if draft
            .weight_kg
            .is_some_and(|kg| !(kg > 0.0 && kg <= PET_WEIGHT_MAX_KG))
        {
            return Err(PetValidationError::WeightOutOfRange {
                max: PET_WEIGHT_MAX_KG,
            });
        }
        let breed = draft
            .breed
            .map(|b| b.trim().to_owned())
            .filter(|b| !b.is_empty());
        Ok(Self {
            name: name.to_owned(),
            species: species.to_ascii_lowercase(),
            breed,
            age_years: draft.age_years,
            gender: draft.gender,
            is_neutered: draft.is_neutered,
            weight_kg: draft.weight_kg,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn breed(&self) -> Option<&str> {
        self.breed.as_deref()
    }

    pub fn age_years(&self) -> Option<u16> {
        self.age_years
    }

    pub fn gender(&self) -> Option<PetGender> {
        self.gender
    }

    pub fn is_neutered(&self) -> bool {
        self.is_neutered
    }

    pub fn weight_kg(&self) -> Option<f64> {
        self.weight_kg
    }
}

/// Persisted pet.
#[derive(Debug, Clone, PartialEq)]
pub struct Pet {
    pub id: PetId,
    pub owner: AccountId,
    pub profile: PetProfile,
    pub created_at: DateTime<Utc>,
}
