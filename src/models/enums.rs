use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Sex {
    Male => "male",
    Female => "female",
});

str_enum!(PersonKind {
    Client => "client",
    Anonymous => "anonymous",
});

/// Primary drug classification of a client. Value set matches the national
/// RVKPP reporting form groupings.
str_enum!(Drug {
    Heroin => "heroin",
    SubutexLegal => "subutex_legal",
    SubutexIllegal => "subutex_illegal",
    Suboxone => "suboxone",
    Methadone => "methadone",
    Vendal => "vendal",
    RawOpium => "raw_opium",
    Braun => "braun",
    Methamphetamine => "methamphetamine",
    Cocaine => "cocaine",
    Thc => "thc",
    Ecstasy => "ecstasy",
    Lsd => "lsd",
    Psilocybe => "psilocybe",
    Inhalants => "inhalants",
    DesignerDrugs => "designer_drugs",
    Medicaments => "medicaments",
    Alcohol => "alcohol",
    Tobacco => "tobacco",
    PathologicalGambling => "pathological_gambling",
    OtherNonSubstanceAddiction => "other_non_substance_addiction",
});

str_enum!(DrugApplication {
    VeinInjection => "vein_injection",
    MuscleInjection => "muscle_injection",
    Sniffing => "sniffing",
    Smoking => "smoking",
    Oral => "oral",
    Anal => "anal",
});

str_enum!(Disease {
    Hiv => "hiv",
    Vha => "vha",
    Vhb => "vhb",
    Vhc => "vhc",
    Syphilis => "syphilis",
});

str_enum!(TestSign {
    Positive => "positive",
    Negative => "negative",
    Inconclusive => "inconclusive",
});

str_enum!(RiskyBehavior {
    IntravenousApplication => "intravenous_application",
    SyringeSharing => "syringe_sharing",
    UnprotectedSex => "unprotected_sex",
});

/// Frequency of a risky behavior, tracked separately for past and present.
str_enum!(Periodicity {
    Never => "never",
    Once => "once",
    Often => "often",
});

/// Discriminator tag of a performed service. Mirrors the serde tag of
/// `ServiceDetail` so the services table can be filtered in SQL.
str_enum!(ServiceKind {
    Address => "address",
    ContactWork => "contact_work",
    IncomeFormFillup => "income_form_fillup",
    IncomeExamination => "income_examination",
    IndividualCounselling => "individual_counselling",
    GroupCounselling => "group_counselling",
    CrisisIntervention => "crisis_intervention",
    SocialWork => "social_work",
    HarmReduction => "harm_reduction",
    BasicMedicalTreatment => "basic_medical_treatment",
    InformationService => "information_service",
    DiseaseTest => "disease_test",
    HygienicService => "hygienic_service",
    FoodService => "food_service",
    WorkTherapy => "work_therapy",
    WorkTherapyMeeting => "work_therapy_meeting",
    UtilityWork => "utility_work",
    AsistService => "asist_service",
    PostUsage => "post_usage",
    UrineTest => "urine_test",
    WorkWithFamily => "work_with_family",
    PhoneCounselling => "phone_counselling",
});

/// Where a client was accompanied to (asist service multi-select).
str_enum!(AsistTarget {
    Medical => "medical",
    Social => "social",
    MedicalFacility => "medical_facility",
    Other => "other",
});

/// Referral targets of a utility-work service (multi-select).
str_enum!(ReferralTarget {
    FieldProgramme => "field_programme",
    ContactCenter => "contact_center",
    MedicalFacility => "medical_facility",
    ExchangeProgramme => "exchange_programme",
    CrisisCenter => "crisis_center",
    Tests => "tests",
    HealthcareServices => "healthcare_services",
    SocialServices => "social_services",
    NoReferral => "no_referral",
    Cancelled => "cancelled",
    Other => "other",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn drug_round_trip() {
        for (variant, s) in [
            (Drug::Heroin, "heroin"),
            (Drug::Suboxone, "suboxone"),
            (Drug::Methamphetamine, "methamphetamine"),
            (Drug::Alcohol, "alcohol"),
            (Drug::Tobacco, "tobacco"),
            (Drug::PathologicalGambling, "pathological_gambling"),
            (Drug::OtherNonSubstanceAddiction, "other_non_substance_addiction"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Drug::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn periodicity_round_trip() {
        for (variant, s) in [
            (Periodicity::Never, "never"),
            (Periodicity::Once, "once"),
            (Periodicity::Often, "often"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Periodicity::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn service_kind_round_trip() {
        for (variant, s) in [
            (ServiceKind::HarmReduction, "harm_reduction"),
            (ServiceKind::DiseaseTest, "disease_test"),
            (ServiceKind::IncomeExamination, "income_examination"),
            (ServiceKind::UrineTest, "urine_test"),
            (ServiceKind::PhoneCounselling, "phone_counselling"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ServiceKind::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Drug::from_str("crack").is_err());
        assert!(Periodicity::from_str("").is_err());
        assert!(ServiceKind::from_str("unknown").is_err());
    }
}
