//! Static tables: bulk layout, mandatory set, product lookup, mapping table.

use std::collections::BTreeMap;

use crate::spec::{EnumMappingRule, SpecFieldSpec, SpecMappingRule, SpecProductCodeLookup};

/// Width of the CMS bulk layout.
pub const N_NCOLS_BULK: usize = 76;
/// Number of mandatory bulk columns.
pub const N_NCOLS_BULK_MANDATORY: usize = 24;
/// Header rows assumed in a bulk source sheet.
pub const N_NROWS_HEADER_DEFAULT: usize = 1;

/// CSV field delimiter.
pub const C_CSV_DELIMITER: u8 = b';';
/// CSV escape character, written before every char in `TUP_CSV_ESCAPED_CHARS`.
pub const C_CSV_ESCAPE: char = '\\';
/// CSV record terminator.
pub const C_CSV_TERMINATOR: u8 = b'\n';

/// Placeholder characters removed from bulk cells before the emptiness check.
pub const TUP_PLACEHOLDER_CHARS: [char; 1] = ['-'];
/// Characters that would break the positional CSV contract.
pub const TUP_CSV_UNSAFE_CHARS: [char; 3] = [';', '\r', '\n'];
/// Characters escaped in unquoted CSV fields.
pub const TUP_CSV_ESCAPED_CHARS: [char; 2] = [C_CSV_ESCAPE, '"'];

/// File name prefix of the emitted CSV.
pub const C_CSV_FILE_PREFIX: &str = "CSC_Converted";
/// File name prefix of the filled destination template.
pub const C_TEMPLATE_FILE_PREFIX: &str = "CMS_Bulk_Template";

/// Literal prefix of generated client numbers.
pub const C_CLIENT_NUMBER_PREFIX: &str = "6042025";
/// Zero-padded width of the client sequence suffix.
pub const N_CLIENT_SEQUENCE_WIDTH: usize = 4;
/// First 1-based data row of the destination template.
pub const N_TEMPLATE_ROW_START: usize = 2;

/// Daily-extract source column: full name in English.
pub const C_COL_FULL_NAME: &str = "Full Name in English";
/// Daily-extract source column: phone number.
pub const C_COL_PHONE: &str = "Phone number";
/// Daily-extract source column: identification expiry date.
pub const C_COL_ID_EXPIRY: &str = "Identification expiry date";
/// Daily-extract source column: card type code.
pub const C_COL_CARD_TYPE: &str = "Card Type";
/// Daily-extract source column: identity number.
pub const C_COL_IDENTITY: &str = "Identity number";
/// Daily-extract source column: street.
pub const C_COL_STREET: &str = "Street";
/// Daily-extract source column: bank account.
pub const C_COL_BANK_ACCOUNT: &str = "Bank account";

/// Default card-type to product-code table.
pub const TUP_PRODUCT_CODES: [(i64, &str); 2] = [(1, "1201"), (7, "1203")];

////////////////////////////////////////////////////////////////////////////////
// #region BulkLayout

macro_rules! define_bulk_fields {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Semantic name of every position in the bulk layout, in column order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum EnumBulkField {
            $(
                #[doc = $name]
                $variant,
            )+
        }

        /// All bulk fields ordered by 0-based column index.
        pub const L_BULK_FIELDS: [EnumBulkField; N_NCOLS_BULK] = [$(EnumBulkField::$variant),+];

        impl EnumBulkField {
            /// Human-readable field name used in validation reports.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

define_bulk_fields! {
    RecordDate => "Record Date",
    InstitutionNumber => "Institution Number",
    BranchNumber => "Branch Number",
    ClientNumber => "Client Number",
    ClientType => "Client Type",
    ClientCategory => "Client Category",
    VipFlag => "VIP Flag",
    IdNumber => "ID Number",
    Title => "Title",
    NationalityCode => "Nationality Code",
    Gender => "Gender",
    FirstName => "First Name",
    MiddleName => "Middle Name",
    LastName => "Last Name",
    BirthDate => "Birth Date",
    MaritalStatus => "Marital Status",
    IdType => "ID Type",
    ClientReferenceNumber => "Client Reference Number",
    ResidenceStatus => "Residence Status",
    Occupation => "Occupation",
    CountryCode => "Country Code",
    MobilePhone => "Mobile Phone",
    HomePhone => "Home Phone",
    Email => "Email",
    AddressType => "Address Type",
    AddressCountryCode => "Address Country Code",
    AddressLine1 => "Address Line 1",
    AddressLine2 => "Address Line 2",
    AddressLine3 => "Address Line 3",
    City => "City",
    PostalCode => "Postal Code",
    CardDeliveryMethod => "Card Delivery Method",
    StatementFlag => "Statement Flag",
    AccountNumber => "Account Number",
    EmbossedName => "Embossed Name",
    AccountCurrency => "Account Currency",
    CreditLimit => "Credit Limit",
    AccountType => "Account Type",
    CardholderName => "Cardholder Name",
    CardStatus => "Card Status",
    CardFeeCode => "Card Fee Code",
    CardValidityMonths => "Card Validity Months",
    PinMailerFlag => "PIN Mailer Flag",
    ServiceCode => "Service Code",
    ProductCode => "Product Code",
    CardBranch => "Card Branch",
    DeliveryBranch => "Delivery Branch",
    EmbossingLine2 => "Embossing Line 2",
    MotherMaidenName => "Mother Maiden Name",
    SecretQuestion => "Secret Question",
    SecretAnswer => "Secret Answer",
    EmployerName => "Employer Name",
    MonthlyIncome => "Monthly Income",
    IdExpiryDate => "ID Expiry Date",
    PassportNumber => "Passport Number",
    PassportExpiryDate => "Passport Expiry Date",
    ResidencePermitNumber => "Residence Permit Number",
    WorkPhone => "Work Phone",
    FaxNumber => "Fax Number",
    SmsNotificationFlag => "SMS Notification Flag",
    EmailNotificationFlag => "Email Notification Flag",
    LanguageCode => "Language Code",
    RiskCategory => "Risk Category",
    LimitGroup => "Limit Group",
    FeeGroup => "Fee Group",
    LoyaltyFlag => "Loyalty Flag",
    ReferralCode => "Referral Code",
    SalesAgentCode => "Sales Agent Code",
    PromoCode => "Promo Code",
    SupplementaryFlag => "Supplementary Flag",
    PrimaryCardNumber => "Primary Card Number",
    RelationshipCode => "Relationship Code",
    CardActionCode => "Card Action Code",
    Reserved1 => "Reserved 1",
    Reserved2 => "Reserved 2",
    Reserved3 => "Reserved 3",
}

impl EnumBulkField {
    /// Zero-based position in the bulk layout.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// One-based destination column in the bulk template.
    pub const fn column(self) -> usize {
        self as usize + 1
    }

    /// Resolve a zero-based position.
    pub fn from_index(n_idx: usize) -> Option<Self> {
        L_BULK_FIELDS.get(n_idx).copied()
    }

    /// Whether the field must be non-empty for a bulk row to be accepted.
    pub fn is_mandatory(self) -> bool {
        TUP_MANDATORY_BULK_FIELDS.contains(&self)
    }
}

/// Mandatory bulk fields, ordered by column.
pub const TUP_MANDATORY_BULK_FIELDS: [EnumBulkField; N_NCOLS_BULK_MANDATORY] = [
    EnumBulkField::RecordDate,
    EnumBulkField::InstitutionNumber,
    EnumBulkField::BranchNumber,
    EnumBulkField::ClientNumber,
    EnumBulkField::ClientType,
    EnumBulkField::ClientCategory,
    EnumBulkField::IdNumber,
    EnumBulkField::NationalityCode,
    EnumBulkField::FirstName,
    EnumBulkField::IdType,
    EnumBulkField::ClientReferenceNumber,
    EnumBulkField::ResidenceStatus,
    EnumBulkField::CountryCode,
    EnumBulkField::MobilePhone,
    EnumBulkField::AddressType,
    EnumBulkField::AddressCountryCode,
    EnumBulkField::AddressLine1,
    EnumBulkField::CardDeliveryMethod,
    EnumBulkField::AccountNumber,
    EnumBulkField::EmbossedName,
    EnumBulkField::CreditLimit,
    EnumBulkField::ProductCode,
    EnumBulkField::IdExpiryDate,
    EnumBulkField::CardActionCode,
];

/// Build the positional field table for all 76 columns.
pub fn derive_bulk_field_specs() -> Vec<SpecFieldSpec> {
    L_BULK_FIELDS
        .iter()
        .map(|field| SpecFieldSpec {
            column_index: field.index(),
            name: field.name(),
            mandatory: field.is_mandatory(),
        })
        .collect()
}

/// Build the mandatory subset of the positional field table.
pub fn derive_mandatory_field_specs() -> Vec<SpecFieldSpec> {
    derive_bulk_field_specs()
        .into_iter()
        .filter(|spec| spec.mandatory)
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DefaultTables

/// Build the default card-type lookup.
pub fn derive_default_product_lookup() -> SpecProductCodeLookup {
    SpecProductCodeLookup::new(
        TUP_PRODUCT_CODES
            .iter()
            .map(|(n_code, c_product)| (*n_code, c_product.to_string()))
            .collect::<BTreeMap<_, _>>(),
    )
}

/// Build the default daily-extract to bulk-template mapping table.
pub fn derive_default_mapping_rules() -> Vec<SpecMappingRule> {
    use EnumBulkField as F;
    use EnumMappingRule as R;

    let constant = |value: &str| R::Constant(value.to_string());
    let copy = |column: &str| R::Copy(column.to_string());

    vec![
        SpecMappingRule::new(F::RecordDate, R::RecordDate),
        SpecMappingRule::new(F::InstitutionNumber, constant("012")),
        SpecMappingRule::new(F::BranchNumber, constant("0012")),
        SpecMappingRule::new(F::ClientNumber, R::ClientNumber),
        SpecMappingRule::new(F::ClientType, constant("C")),
        SpecMappingRule::new(F::ClientCategory, constant("C")),
        SpecMappingRule::new(F::VipFlag, constant("N")),
        SpecMappingRule::new(F::IdNumber, copy(C_COL_IDENTITY)),
        SpecMappingRule::new(F::NationalityCode, constant("37")),
        SpecMappingRule::new(F::FirstName, R::NameToken(C_COL_FULL_NAME.to_string(), 0)),
        SpecMappingRule::new(F::MiddleName, R::NameToken(C_COL_FULL_NAME.to_string(), 1)),
        SpecMappingRule::new(F::LastName, R::NameToken(C_COL_FULL_NAME.to_string(), 2)),
        SpecMappingRule::new(F::IdType, constant("01")),
        SpecMappingRule::new(F::ClientReferenceNumber, copy(C_COL_IDENTITY)),
        SpecMappingRule::new(F::ResidenceStatus, constant("01")),
        SpecMappingRule::new(F::CountryCode, constant("400")),
        SpecMappingRule::new(F::MobilePhone, R::Phone(C_COL_PHONE.to_string())),
        SpecMappingRule::new(F::AddressType, constant("001")),
        SpecMappingRule::new(F::AddressCountryCode, constant("400")),
        SpecMappingRule::new(F::AddressLine1, copy(C_COL_STREET)),
        SpecMappingRule::new(F::CardDeliveryMethod, constant("2")),
        SpecMappingRule::new(F::StatementFlag, constant("N")),
        SpecMappingRule::new(F::AccountNumber, copy(C_COL_BANK_ACCOUNT)),
        SpecMappingRule::new(F::EmbossedName, copy(C_COL_FULL_NAME)),
        SpecMappingRule::new(F::CreditLimit, constant("0")),
        SpecMappingRule::new(F::CardholderName, copy(C_COL_FULL_NAME)),
        SpecMappingRule::new(F::ProductCode, R::ProductCode(C_COL_CARD_TYPE.to_string())),
        SpecMappingRule::new(F::IdExpiryDate, R::ExpiryDate(C_COL_ID_EXPIRY.to_string())),
    ]
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_fields_are_indexed_in_declaration_order() {
        for (n_idx, field) in L_BULK_FIELDS.iter().enumerate() {
            assert_eq!(field.index(), n_idx);
            assert_eq!(EnumBulkField::from_index(n_idx), Some(*field));
        }
        assert_eq!(EnumBulkField::from_index(N_NCOLS_BULK), None);
        assert_eq!(EnumBulkField::RecordDate.name(), "Record Date");
        assert_eq!(EnumBulkField::InstitutionNumber.index(), 1);
        assert_eq!(EnumBulkField::IdExpiryDate.index(), 53);
        assert_eq!(EnumBulkField::IdExpiryDate.column(), 54);
    }

    #[test]
    fn test_mandatory_table_has_24_sorted_entries() {
        let l_specs = derive_mandatory_field_specs();
        assert_eq!(l_specs.len(), N_NCOLS_BULK_MANDATORY);
        assert!(
            l_specs
                .windows(2)
                .all(|pair| pair[0].column_index < pair[1].column_index)
        );
        assert_eq!(l_specs[0].name, "Record Date");
        assert_eq!(l_specs[1].name, "Institution Number");
        assert!(l_specs.iter().any(|spec| spec.column_index == 72));
        assert_eq!(derive_bulk_field_specs().len(), N_NCOLS_BULK);
    }

    #[test]
    fn test_mapping_rules_target_unique_columns() {
        let l_rules = derive_default_mapping_rules();
        let l_cols: Vec<usize> = l_rules.iter().map(|rule| rule.field.column()).collect();
        assert!(l_cols.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(l_cols.len(), 28);
        assert_eq!(l_cols.first(), Some(&1));
        assert_eq!(l_cols.last(), Some(&54));
    }

    #[test]
    fn test_default_product_lookup() {
        let lookup = derive_default_product_lookup();
        assert_eq!(lookup.resolve(1), Some("1201"));
        assert_eq!(lookup.resolve(7), Some("1203"));
        assert_eq!(lookup.resolve(9), None);
    }
}
