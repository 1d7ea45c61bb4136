use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;

use super::enums::{AsistTarget, Disease, ReferralTarget, ServiceKind, TestSign};

/// One performed service. The subtype-specific fields live in `detail`;
/// the `kind()` tag is duplicated into its own column on insert so SQL can
/// filter without touching the JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub encounter_id: Uuid,
    pub detail: ServiceDetail,
}

impl Service {
    pub fn new(encounter_id: Uuid, detail: ServiceDetail) -> Self {
        Self {
            id: Uuid::new_v4(),
            encounter_id,
            detail,
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.detail.kind()
    }
}

/// Subtype-specific payload of a service, one variant per service kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceDetail {
    /// Oslovení
    Address,
    /// Kontaktní práce
    ContactWork,
    /// Vyplnění IN-COME dotazníku
    IncomeFormFillup,
    /// První kontakt
    IncomeExamination,
    /// Základní poradenství
    IndividualCounselling,
    /// Skupinové poradenství
    GroupCounselling,
    /// Krizová intervence
    CrisisIntervention,
    /// Případová práce
    SocialWork {
        socio_legal: bool,
        counselling: bool,
        service_mediation: bool,
        other: bool,
    },
    /// Výměnný a jiný harm reduction program
    HarmReduction {
        in_count: u32,
        out_count: u32,
        svip_person_count: u32,
        standard: bool,
        acid: bool,
        alternatives: bool,
        condoms: bool,
        stericup: bool,
        other: bool,
        pregnancy_test: bool,
        medical_supplies: bool,
    },
    /// Základní zdravotní ošetření
    BasicMedicalTreatment,
    /// Informační servis
    InformationService {
        safe_usage: bool,
        safe_sex: bool,
        medical: bool,
        socio_legal: bool,
        cure_possibilities: bool,
        literature: bool,
        other: bool,
    },
    /// Testování infekčních nemocí
    DiseaseTest {
        pre_test_advice: bool,
        test_execution: bool,
        post_test_advice: bool,
        disease: Option<Disease>,
        sign: Option<TestSign>,
    },
    /// Hygienický servis
    HygienicService,
    /// Potravinový servis
    FoodService,
    /// Pracovní terapie
    WorkTherapy,
    /// Setkání pracovní terapie
    WorkTherapyMeeting,
    /// Odkazy
    UtilityWork { refs: Vec<ReferralTarget> },
    /// Doprovod klienta
    AsistService {
        targets: Vec<AsistTarget>,
        note: Option<String>,
    },
    /// Korespondenční práce
    PostUsage,
    /// Orientační test z moči
    UrineTest {
        pregnancy_test: bool,
        drug_test: bool,
    },
    /// Práce s rodinou
    WorkWithFamily,
    /// Telefonický kontakt
    PhoneCounselling,
}

impl ServiceDetail {
    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::Address => ServiceKind::Address,
            Self::ContactWork => ServiceKind::ContactWork,
            Self::IncomeFormFillup => ServiceKind::IncomeFormFillup,
            Self::IncomeExamination => ServiceKind::IncomeExamination,
            Self::IndividualCounselling => ServiceKind::IndividualCounselling,
            Self::GroupCounselling => ServiceKind::GroupCounselling,
            Self::CrisisIntervention => ServiceKind::CrisisIntervention,
            Self::SocialWork { .. } => ServiceKind::SocialWork,
            Self::HarmReduction { .. } => ServiceKind::HarmReduction,
            Self::BasicMedicalTreatment => ServiceKind::BasicMedicalTreatment,
            Self::InformationService { .. } => ServiceKind::InformationService,
            Self::DiseaseTest { .. } => ServiceKind::DiseaseTest,
            Self::HygienicService => ServiceKind::HygienicService,
            Self::FoodService => ServiceKind::FoodService,
            Self::WorkTherapy => ServiceKind::WorkTherapy,
            Self::WorkTherapyMeeting => ServiceKind::WorkTherapyMeeting,
            Self::UtilityWork { .. } => ServiceKind::UtilityWork,
            Self::AsistService { .. } => ServiceKind::AsistService,
            Self::PostUsage => ServiceKind::PostUsage,
            Self::UrineTest { .. } => ServiceKind::UrineTest,
            Self::WorkWithFamily => ServiceKind::WorkWithFamily,
            Self::PhoneCounselling => ServiceKind::PhoneCounselling,
        }
    }

    /// Form-level consistency rules. Messages are user-facing and localized.
    pub fn validate(&self) -> Result<(), DatabaseError> {
        if let Self::DiseaseTest {
            pre_test_advice,
            test_execution,
            post_test_advice,
            disease,
            sign,
        } = self
        {
            if !(pre_test_advice | test_execution | post_test_advice) {
                return Err(DatabaseError::Validation(
                    "Vyberte alespoň jednu možnost: předtestové poradenství\
                     /provedení testu/potestové poradenství."
                        .into(),
                ));
            }
            if *test_execution && (disease.is_none() || sign.is_none()) {
                return Err(DatabaseError::Validation(
                    "Zadejte prosím parametry testu (testované onemocnění a stav).".into(),
                ));
            }
            if !*test_execution && (disease.is_some() || sign.is_some()) {
                return Err(DatabaseError::Validation(
                    "Nelze zadávat parametry testu, pokud test nebyl proveden.".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disease_test(
        execution: bool,
        disease: Option<Disease>,
        sign: Option<TestSign>,
    ) -> ServiceDetail {
        ServiceDetail::DiseaseTest {
            pre_test_advice: false,
            test_execution: execution,
            post_test_advice: false,
            disease,
            sign,
        }
    }

    #[test]
    fn detail_kind_matches_tag() {
        let detail = ServiceDetail::HarmReduction {
            in_count: 10,
            out_count: 12,
            svip_person_count: 2,
            standard: true,
            acid: false,
            alternatives: false,
            condoms: true,
            stericup: false,
            other: false,
            pregnancy_test: false,
            medical_supplies: false,
        };
        assert_eq!(detail.kind(), ServiceKind::HarmReduction);

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["kind"], "harm_reduction");
        assert_eq!(json["kind"], detail.kind().as_str());
    }

    #[test]
    fn unit_variants_serialize_with_tag() {
        let json = serde_json::to_value(ServiceDetail::ContactWork).unwrap();
        assert_eq!(json["kind"], "contact_work");

        let back: ServiceDetail =
            serde_json::from_value(serde_json::json!({"kind": "food_service"})).unwrap();
        assert_eq!(back.kind(), ServiceKind::FoodService);
    }

    #[test]
    fn disease_test_requires_at_least_one_stage() {
        let detail = disease_test(false, None, None);
        assert!(matches!(
            detail.validate(),
            Err(DatabaseError::Validation(_))
        ));
    }

    #[test]
    fn disease_test_execution_requires_parameters() {
        let detail = disease_test(true, Some(Disease::Hiv), None);
        assert!(detail.validate().is_err());

        let detail = disease_test(true, Some(Disease::Hiv), Some(TestSign::Negative));
        assert!(detail.validate().is_ok());
    }

    #[test]
    fn disease_test_parameters_forbidden_without_execution() {
        let mut detail = disease_test(false, Some(Disease::Vhc), None);
        if let ServiceDetail::DiseaseTest {
            ref mut pre_test_advice,
            ..
        } = detail
        {
            *pre_test_advice = true;
        }
        assert!(detail.validate().is_err());
    }

    #[test]
    fn non_disease_details_always_validate() {
        assert!(ServiceDetail::ContactWork.validate().is_ok());
        assert!(ServiceDetail::UtilityWork {
            refs: vec![ReferralTarget::Tests, ReferralTarget::ContactCenter]
        }
        .validate()
        .is_ok());
    }
}
