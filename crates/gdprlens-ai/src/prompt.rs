//! Prompt templates for GDPR case annotation.

use gdprlens_core::ANNOTATION_FIELDS;

pub const SYSTEM_PROMPT: &str = "You are a GDPR compliance analyst.";

/// Message sent by the connectivity check.
pub const PING_PROMPT: &str = "Hello, are you working?";

const ANNOTATION_TEMPLATE: &str = "\
Analyze the following GDPR case text. One file is one case: read through the whole case and \
extract information strictly following these requirements.
Extract structured data from the case, ensuring each field contains only the exact values from \
the case text. Give exactly one answer for each requirement. Your output must be one line of JSON.

For fields that could have multiple valid values, extract all applicable values, but keep them \
concise and on the same line.

Requirements:
1. For each of the following data category components, output a separate field with a binary \
value (1 indicates the information is present in the text; 0 indicates it is absent):
- data_category_Basic_personal_data: 1 if the case is about basic personal data such as \"address\", \"DoB\", or \"ID\"; otherwise 0.
- data_category_Special_category_data: 1 if the text contains any of \"race\", \"religion\", \"sexual orientation\", \"biometrics\", or \"genetic data\"; otherwise 0.
- data_category_Criminal_data: 1 if the case is about \"criminal records\" or \"court judgments\"; otherwise 0.
- data_category_Financial_location_data: 1 if the case is about \"financial\" or \"location\" data; otherwise 0.
- data_category_Children_data: 1 if the case is related to \"children\", a \"child\", or \"children's data\"; otherwise 0.

2. For each of the following processing basis components, output a separate field with a binary \
value (1 for presence, 0 for absence) based strictly on the text:
- data_processing_basis_Legitimate_interest: 1 if the processing is based on \"legitimate interest\" or related descriptions (e.g., \"marketing\"); otherwise 0.
- data_processing_basis_contract_performance: 1 if the data processing is required by a contract; otherwise 0.
- data_processing_basis_Consent: 1 if the data processing is based on \"consent\"; otherwise 0.
- data_processing_basis_Legal_obligation: 1 if the processing is required by a \"legal obligation\" or related descriptions (e.g., \"tax reporting\"); otherwise 0.
- data_processing_basis_Protection_of_vital_interests: 1 if the processing is for the \"protection of vital interests\"; otherwise 0.
- data_processing_basis_Performance_of_public_task: 1 if the processing is for the \"performance of a public task\"; otherwise 0.

3. fine_amount:
   - Exact amount with currency (e.g., \"200,000\")
   - \"Not specified\" if unclear
   - 0 if no fine

4. country:
   - Full country name in English (e.g., \"Germany\")

5. company_industry, choose from:
   - Public sector (court, government, or a company providing services to the government)
   - Marketing (advertisement, profiling, cases about marketing)
   - Education (any school)
   - Medical (hospitals, medical investigations, anything medical)
   - Retail (selling products and services, and anything unspecific)
   - Human resources (cases about the HR department of any kind of company)
   - Security Service (monitoring, surveillance)
   - Leisure (entertainment, fitness)
   - Social Media (internet companies, websites, online markets, social media)
   - Individual
   - Insurance

6. gdpr_clause:
   - Specific article reference (e.g., \"Article 9(2)(a)\")

7. gdpr_conflict, choose from:
   - yes
   - No conflict (if not mentioned)

8. For each of the following violation nature components, output a separate field with a binary \
value (1 for presence, 0 for absence) based strictly on the text:
- violation_nature_Breach_of_Data_processing_principle: 1 if the text describes a breach of a data processing principle (e.g., \"data minimization\"); otherwise 0.
- violation_nature_Violation_of_data_subject_rights: 1 if the text describes a violation of data subject rights; otherwise 0.
- violation_nature_Breach_of_data_security: 1 if the text describes a breach of data security; otherwise 0.
- violation_nature_Violation_of_Data_processing_obligation: 1 if the text describes a violation of a data processing obligation (e.g., \"DPO\"); otherwise 0.

9. Exemptions, 1 if applicable, 0 if not:
- free_speech_exception
- country_security_exception
- Criminal_investigation_exception

10. violation_result: 1 if a violation was found, otherwise 0.

11. Affected_data_volume:
   - Numerical value or qualitative estimate (e.g., \"500,000 records affected\")
   - \"unspecific\" if not stated

12. Date:
   - Year of this case

Rules:
- Values MUST come directly from the text.
- No assumptions or interpretations.
- Keep the original phrasing for extracted values.
- If there are multiple valid values, output them as an array (e.g., [\"value1\", \"value2\"]).
- Return only one line of JSON.

Text:
{text}


Return one line of valid JSON with exactly these keys: {keys}
";

/// Build the user message embedding `text` in the extraction template.
pub fn annotation_prompt(text: &str) -> String {
    let keys = ANNOTATION_FIELDS
        .iter()
        .map(|f| f.name)
        .collect::<Vec<_>>()
        .join(", ");
    // Keys first: the case text may itself contain "{keys}".
    ANNOTATION_TEMPLATE
        .replace("{keys}", &keys)
        .replacen("{text}", text, 1)
}
