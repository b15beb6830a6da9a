//! Modelos de dados do registro diário de fluxo
//!
//! Cada campo categórico do formulário é um enum fechado. O rótulo em
//! português é exatamente o texto persistido na tabela, então um valor fora
//! do domínio é rejeitado na conversão e nunca chega ao repositório.

use chrono::{NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation;

/// Formato de `Data_Registro` na tabela persistida
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Colunas da tabela, na ordem em que são gravadas
pub const COLUMNS: [&str; 8] = [
    "Data_Registro",
    "Tipo_Usuario",
    "Origem",
    "Tipo_Solicitacao",
    "Satisfacao",
    "Resolvida",
    "Perda_Volume",
    "Motivo_Perda",
];

/// Declara um enum de formulário com rótulo persistido, lista de valores e conversão de texto
macro_rules! form_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident in $column:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            /// Coluna da tabela que guarda este campo
            pub const COLUMN: &'static str = $column;

            /// Todos os valores, na ordem apresentada no formulário
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($label => Ok($name::$variant),)+
                    _ => Err(ValidationError::InvalidValue {
                        field: $name::COLUMN,
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

form_enum! {
    /// Quem fez a solicitação
    pub enum UserType in "Tipo_Usuario" {
        Patient => "Paciente",
        Relative => "Familiar",
        ExternalPhysician => "Médico Externo",
        InternalStaff => "Staff Interno",
    }
}

form_enum! {
    /// Canal por onde a demanda chegou
    pub enum Channel in "Origem" {
        InPerson => "Pessoal",
        WhatsApp => "WhatsApp",
        Phone => "Telefone",
        Email => "E-mail",
    }
}

form_enum! {
    /// Tipo de demanda atendida
    pub enum RequestType in "Tipo_Solicitacao" {
        Scheduling => "Agendamento/Reagendamento",
        TreatmentConfirmation => "Confirmação de Tratamento",
        Crisis => "Crise/Conflito",
        Paperwork => "Documentação/Convênio",
        Logistics => "Dúvida de Fluxo/Logística",
        Other => "Outro",
    }
}

form_enum! {
    /// Nível de satisfação, ordenado do pior para o melhor
    pub enum Satisfaction in "Satisfacao" {
        Critical => "1-Crítico",
        Poor => "2-Ruim",
        Neutral => "3-Neutro",
        Good => "4-Bom",
        Excellent => "5-Excelente",
    }
}

form_enum! {
    /// Se a demanda foi resolvida no atendimento
    pub enum Resolution in "Resolvida" {
        Resolved => "Sim",
        Pending => "Não (Pendência)",
    }
}

form_enum! {
    /// Se houve perda do paciente para um concorrente
    pub enum VolumeLoss in "Perda_Volume" {
        No => "Não",
        Yes => "Sim (Perda de Volume)",
    }
}

form_enum! {
    /// Motivo principal da perda; `N/A` quando não houve perda
    pub enum LossReason in "Motivo_Perda" {
        Coverage => "Cobertura/Convênio",
        NoAvailability => "Agenda Indisponível",
        Price => "Preço",
        PhysicianPreference => "Preferência Médica",
        Distance => "Distância",
        NotApplicable => "N/A",
    }
}

impl Satisfaction {
    /// Nota de 1 a 5
    pub fn score(&self) -> u8 {
        match self {
            Satisfaction::Critical => 1,
            Satisfaction::Poor => 2,
            Satisfaction::Neutral => 3,
            Satisfaction::Good => 4,
            Satisfaction::Excellent => 5,
        }
    }
}

impl Default for Satisfaction {
    fn default() -> Self {
        Satisfaction::Neutral
    }
}

impl LossReason {
    /// Motivos que podem ser escolhidos quando há perda de volume
    pub const REASONS: &'static [LossReason] = &[
        LossReason::Coverage,
        LossReason::NoAvailability,
        LossReason::Price,
        LossReason::PhysicianPreference,
        LossReason::Distance,
    ];

    pub fn is_reason(&self) -> bool {
        *self != LossReason::NotApplicable
    }

    /// Lê `Motivo_Perda` como gravado na tabela; célula vazia equivale a `N/A`
    pub fn from_stored(label: &str) -> Result<Self, ValidationError> {
        if label.trim().is_empty() {
            Ok(LossReason::NotApplicable)
        } else {
            label.parse()
        }
    }
}

/// Submissão do formulário como chega da interface, campos em texto livre
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionForm {
    #[serde(rename = "Tipo_Usuario", default)]
    pub user_type: String,
    #[serde(rename = "Origem", default)]
    pub channel: String,
    #[serde(rename = "Tipo_Solicitacao", default)]
    pub request_type: String,
    /// Ausente significa o padrão do formulário, 3-Neutro
    #[serde(rename = "Satisfacao", default)]
    pub satisfaction: Option<String>,
    #[serde(rename = "Resolvida", default)]
    pub resolution: String,
    #[serde(rename = "Perda_Volume", default)]
    pub volume_loss: String,
    /// Ausente equivale a `N/A`
    #[serde(rename = "Motivo_Perda", default)]
    pub loss_reason: Option<String>,
}

/// Submissão já convertida para os domínios fechados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub user_type: UserType,
    pub channel: Channel,
    pub request_type: RequestType,
    pub satisfaction: Satisfaction,
    pub resolution: Resolution,
    pub volume_loss: VolumeLoss,
    pub loss_reason: LossReason,
}

impl TryFrom<&SubmissionForm> for Submission {
    type Error = ValidationError;

    fn try_from(form: &SubmissionForm) -> Result<Self, Self::Error> {
        let submission = Submission {
            user_type: form.user_type.parse()?,
            channel: form.channel.parse()?,
            request_type: form.request_type.parse()?,
            satisfaction: match &form.satisfaction {
                Some(label) => label.parse()?,
                None => Satisfaction::default(),
            },
            resolution: form.resolution.parse()?,
            volume_loss: form.volume_loss.parse()?,
            loss_reason: match &form.loss_reason {
                Some(label) => label.parse()?,
                None => LossReason::NotApplicable,
            },
        };
        validation::check_loss_reason(submission.volume_loss, submission.loss_reason)?;
        Ok(submission)
    }
}

/// Um atendimento registrado. Imutável depois de criado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordRow")]
pub struct Record {
    #[serde(rename = "Data_Registro", serialize_with = "timestamp::serialize")]
    registered_at: NaiveDateTime,
    #[serde(rename = "Tipo_Usuario")]
    user_type: UserType,
    #[serde(rename = "Origem")]
    channel: Channel,
    #[serde(rename = "Tipo_Solicitacao")]
    request_type: RequestType,
    #[serde(rename = "Satisfacao")]
    satisfaction: Satisfaction,
    #[serde(rename = "Resolvida")]
    resolution: Resolution,
    #[serde(rename = "Perda_Volume")]
    volume_loss: VolumeLoss,
    #[serde(rename = "Motivo_Perda")]
    loss_reason: LossReason,
}

impl Record {
    /// Cria um registro para o instante informado.
    ///
    /// Frações de segundo são descartadas, pois a tabela guarda segundos.
    pub fn new(registered_at: NaiveDateTime, submission: Submission) -> Result<Self, ValidationError> {
        validation::check_loss_reason(submission.volume_loss, submission.loss_reason)?;
        Ok(Self {
            registered_at: registered_at.trunc_subsecs(0),
            user_type: submission.user_type,
            channel: submission.channel,
            request_type: submission.request_type,
            satisfaction: submission.satisfaction,
            resolution: submission.resolution,
            volume_loss: submission.volume_loss,
            loss_reason: submission.loss_reason,
        })
    }

    pub fn registered_at(&self) -> NaiveDateTime {
        self.registered_at
    }

    /// `Data_Registro` no formato persistido
    pub fn registered_at_label(&self) -> String {
        self.registered_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn user_type(&self) -> UserType {
        self.user_type
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn satisfaction(&self) -> Satisfaction {
        self.satisfaction
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn volume_loss(&self) -> VolumeLoss {
        self.volume_loss
    }

    pub fn loss_reason(&self) -> LossReason {
        self.loss_reason
    }

    pub fn is_critical(&self) -> bool {
        self.satisfaction == Satisfaction::Critical
    }

    pub fn is_loss(&self) -> bool {
        self.volume_loss == VolumeLoss::Yes
    }
}

/// Linha lida do armazenamento, antes da checagem de consistência
#[derive(Deserialize)]
struct RecordRow {
    #[serde(rename = "Data_Registro", deserialize_with = "timestamp::deserialize")]
    registered_at: NaiveDateTime,
    #[serde(rename = "Tipo_Usuario")]
    user_type: UserType,
    #[serde(rename = "Origem")]
    channel: Channel,
    #[serde(rename = "Tipo_Solicitacao")]
    request_type: RequestType,
    #[serde(rename = "Satisfacao")]
    satisfaction: Satisfaction,
    #[serde(rename = "Resolvida")]
    resolution: Resolution,
    #[serde(rename = "Perda_Volume")]
    volume_loss: VolumeLoss,
    #[serde(rename = "Motivo_Perda", deserialize_with = "stored_loss_reason")]
    loss_reason: LossReason,
}

fn stored_loss_reason<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<LossReason, D::Error> {
    let label = String::deserialize(deserializer)?;
    LossReason::from_stored(&label).map_err(serde::de::Error::custom)
}

impl TryFrom<RecordRow> for Record {
    type Error = ValidationError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Record::new(
            row.registered_at,
            Submission {
                user_type: row.user_type,
                channel: row.channel,
                request_type: row.request_type,
                satisfaction: row.satisfaction,
                resolution: row.resolution,
                volume_loss: row.volume_loss,
                loss_reason: row.loss_reason,
            },
        )
    }
}

/// Opções de cada campo do formulário, na ordem de exibição
#[derive(Debug, Clone, Serialize)]
pub struct FormOptions {
    #[serde(rename = "Tipo_Usuario")]
    pub user_types: &'static [UserType],
    #[serde(rename = "Origem")]
    pub channels: &'static [Channel],
    #[serde(rename = "Tipo_Solicitacao")]
    pub request_types: &'static [RequestType],
    #[serde(rename = "Satisfacao")]
    pub satisfaction_levels: &'static [Satisfaction],
    #[serde(rename = "Satisfacao_Padrao")]
    pub satisfaction_default: Satisfaction,
    #[serde(rename = "Resolvida")]
    pub resolutions: &'static [Resolution],
    #[serde(rename = "Perda_Volume")]
    pub volume_losses: &'static [VolumeLoss],
    #[serde(rename = "Motivo_Perda")]
    pub loss_reasons: &'static [LossReason],
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            user_types: UserType::ALL,
            channels: Channel::ALL,
            request_types: RequestType::ALL,
            satisfaction_levels: Satisfaction::ALL,
            satisfaction_default: Satisfaction::default(),
            resolutions: Resolution::ALL,
            volume_losses: VolumeLoss::ALL,
            loss_reasons: LossReason::REASONS,
        }
    }
}

/// Serialização de `Data_Registro` no formato da tabela
pub(crate) mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(|e| {
            serde::de::Error::custom(format!("Data_Registro inválida {:?}: {}", text, e))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .unwrap()
    }

    pub(crate) fn form(request_type: &str) -> SubmissionForm {
        SubmissionForm {
            user_type: "Paciente".to_string(),
            channel: "WhatsApp".to_string(),
            request_type: request_type.to_string(),
            satisfaction: Some("4-Bom".to_string()),
            resolution: "Sim".to_string(),
            volume_loss: "Não".to_string(),
            loss_reason: None,
        }
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for user_type in UserType::ALL {
            assert_eq!(user_type.as_str().parse::<UserType>().unwrap(), *user_type);
        }
        assert_eq!("Médico Externo".parse::<UserType>().unwrap(), UserType::ExternalPhysician);
        assert_eq!("Dúvida de Fluxo/Logística".parse::<RequestType>().unwrap(), RequestType::Logistics);
        assert_eq!("Não (Pendência)".parse::<Resolution>().unwrap(), Resolution::Pending);
    }

    #[test]
    fn test_unknown_label_is_rejected_with_column_name() {
        let err = "Fax".parse::<Channel>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidValue {
                field: "Origem",
                value: "Fax".to_string()
            }
        );
        // acentuação faz parte do rótulo
        assert!("Medico Externo".parse::<UserType>().is_err());
    }

    #[test]
    fn test_satisfaction_is_ordinal() {
        assert!(Satisfaction::Critical < Satisfaction::Poor);
        assert!(Satisfaction::Good < Satisfaction::Excellent);
        assert_eq!(Satisfaction::default(), Satisfaction::Neutral);
        let scores: Vec<u8> = Satisfaction::ALL.iter().map(|s| s.score()).collect();
        assert_eq!(scores, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_missing_satisfaction_defaults_to_neutral() {
        let mut input = form("Outro");
        input.satisfaction = None;
        let submission = Submission::try_from(&input).unwrap();
        assert_eq!(submission.satisfaction, Satisfaction::Neutral);
        assert_eq!(submission.loss_reason, LossReason::NotApplicable);
    }

    #[test]
    fn test_loss_without_reason_is_rejected() {
        let mut input = form("Outro");
        input.volume_loss = "Sim (Perda de Volume)".to_string();
        assert_eq!(
            Submission::try_from(&input).unwrap_err(),
            ValidationError::MissingLossReason
        );

        input.loss_reason = Some("N/A".to_string());
        assert_eq!(
            Submission::try_from(&input).unwrap_err(),
            ValidationError::MissingLossReason
        );

        input.loss_reason = Some("Distância".to_string());
        let submission = Submission::try_from(&input).unwrap();
        assert_eq!(submission.loss_reason, LossReason::Distance);
    }

    #[test]
    fn test_reason_without_loss_is_rejected() {
        let mut input = form("Outro");
        input.loss_reason = Some("Preço".to_string());
        assert_eq!(
            Submission::try_from(&input).unwrap_err(),
            ValidationError::UnexpectedLossReason {
                reason: "Preço".to_string()
            }
        );
    }

    #[test]
    fn test_empty_stored_loss_reason_reads_as_not_applicable() {
        assert_eq!(LossReason::from_stored(""), Ok(LossReason::NotApplicable));
        assert_eq!(LossReason::from_stored("N/A"), Ok(LossReason::NotApplicable));
        assert_eq!(LossReason::from_stored("Preço"), Ok(LossReason::Price));
        assert!(LossReason::from_stored("Outro").is_err());
    }

    #[test]
    fn test_record_drops_subsecond_precision() {
        let submission = Submission::try_from(&form("Outro")).unwrap();
        let instant = at(9, 30, 15) + chrono::Duration::milliseconds(750);
        let record = Record::new(instant, submission).unwrap();
        assert_eq!(record.registered_at(), at(9, 30, 15));
        assert_eq!(record.registered_at_label(), "2024-05-17 09:30:15");
    }

    #[test]
    fn test_record_serializes_with_table_columns() {
        let submission = Submission::try_from(&form("Crise/Conflito")).unwrap();
        let record = Record::new(at(8, 0, 0), submission).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for column in COLUMNS {
            assert!(keys.contains(&column), "coluna ausente: {column}");
        }
        assert_eq!(json["Data_Registro"], "2024-05-17 08:00:00");
        assert_eq!(json["Tipo_Solicitacao"], "Crise/Conflito");
        assert_eq!(json["Motivo_Perda"], "N/A");

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_inconsistent_row_does_not_deserialize() {
        let json = serde_json::json!({
            "Data_Registro": "2024-05-17 08:00:00",
            "Tipo_Usuario": "Familiar",
            "Origem": "Telefone",
            "Tipo_Solicitacao": "Outro",
            "Satisfacao": "3-Neutro",
            "Resolvida": "Sim",
            "Perda_Volume": "Não",
            "Motivo_Perda": "Preço",
        });
        assert!(serde_json::from_value::<Record>(json).is_err());
    }

    #[test]
    fn test_form_options_follow_form_order() {
        let options = FormOptions::default();
        assert_eq!(options.user_types.len(), 4);
        assert_eq!(options.request_types.first(), Some(&RequestType::Scheduling));
        assert_eq!(options.satisfaction_default, Satisfaction::Neutral);
        assert!(!options.loss_reasons.contains(&LossReason::NotApplicable));
        assert_eq!(options.loss_reasons.len(), 5);
    }
}
