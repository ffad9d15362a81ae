//! Formal request letter rendered from the application fields.

use time::Date;

use super::repo_types::RequestType;

/// Placeholder printed for fields the borrower left empty.
pub const BLANK: &str = "___________";

const NBSP: char = '\u{a0}';

/// Inputs of [`render`]. Everything except the date comes from the form.
#[derive(Debug, Clone, Copy)]
pub struct LetterInput<'a> {
    pub creditor_name: &'a str,
    pub request_type: RequestType,
    pub contract_number: Option<&'a str>,
    pub debt_amount: Option<f64>,
    pub monthly_income: Option<f64>,
    pub dependents: i64,
    pub description: Option<&'a str>,
}

/// Formats an amount in tenge the way ru-RU locales print numbers:
/// groups of three separated by a no-break space, at most three fraction
/// digits after a comma, trailing zeros dropped.
pub fn format_tenge(value: f64) -> String {
    // Exact decimal expansion; no integer round trip, so huge amounts keep every digit.
    let fixed = format!("{:.3}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && (whole != "0" || !frac.is_empty()) {
        out.push('-');
    }
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(NBSP);
        }
        out.push(ch);
    }
    if !frac.is_empty() {
        out.push(',');
        out.push_str(frac);
    }
    out.push_str(" ₸");
    out
}

fn amount_or_blank(value: Option<f64>) -> String {
    match value {
        Some(v) if v > 0.0 => format_tenge(v),
        _ => BLANK.to_string(),
    }
}

/// `DD.MM.YYYY`
fn format_date(date: Date) -> String {
    format!(
        "{:02}.{:02}.{}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

/// Renders the letter. Pure: the same input and date give the same bytes.
pub fn render(input: &LetterInput<'_>, date: Date) -> String {
    let creditor = input.creditor_name;
    let request = input.request_type.label().to_lowercase();
    let contract = input
        .contract_number
        .filter(|c| !c.is_empty())
        .unwrap_or(BLANK);
    let debt = amount_or_blank(input.debt_amount);
    let income = amount_or_blank(input.monthly_income);
    let dependents = if input.dependents > 0 {
        format!(", количество иждивенцев: {}", input.dependents)
    } else {
        String::new()
    };
    let extra = match input.description.filter(|d| !d.is_empty()) {
        Some(d) => format!("Дополнительная информация: {d}\n"),
        None => String::new(),
    };
    let date = format_date(date);

    format!(
        "Руководителю {creditor}\n\
         От гражданина Республики Казахстан\n\
         \n\
         ЗАЯВЛЕНИЕ\n\
         о {request}\n\
         \n\
         Между мной и {creditor} заключён кредитный договор № {contract}. \
         Сумма текущей задолженности составляет {debt}.\n\
         \n\
         В связи с изменением финансового положения (ежемесячный доход составляет \
         {income}{dependents}), прошу рассмотреть возможность {request} по указанному договору.\n\
         \n\
         В соответствии со статьей 36 Закона Республики Казахстан «О банках и банковской \
         деятельности», а также Постановлением Правления Национального Банка РК, кредитор \
         обязан рассмотреть обращение заёмщика о реструктуризации задолженности при наличии \
         уважительных причин.\n\
         \n\
         {extra}\n\
         Прошу рассмотреть данное заявление в сроки, установленные законодательством РК, \
         и предоставить письменный ответ.\n\
         \n\
         Дата: {date}\n\
         Подпись: {BLANK}"
    )
}
