//! Catalog compiled into the binary.

use super::{Catalog, LabelSet, Language, Mode, RatingBand};
use std::collections::BTreeMap;

const OUTPUT_CONTRACT_EN: &str = "Respond ONLY with a JSON object of the form \
{\"verdict\": \"Smash\" or \"Pass\", \"score\": <integer from 1 to 10>, \"explanation\": <string>}. \
The verdict must be exactly \"Smash\" or \"Pass\" in English. Do not wrap the JSON in markdown.";

const OUTPUT_CONTRACT_ZH: &str = "只输出一个JSON对象，格式为 \
{\"verdict\": \"Smash\" 或 \"Pass\", \"score\": <1到10的整数>, \"explanation\": <字符串>}。\
verdict 必须是英文的 \"Smash\" 或 \"Pass\"，JSON 键名保持英文，explanation 用中文书写。不要用 markdown 包裹 JSON。";

fn instruction(mode: Mode, language: Language) -> String {
    let (role, length, contract) = match language {
        Language::English => (
            "You are a blunt, witty judge. Look at the attached image and decide whether \
             the subject is a Smash or a Pass, then rate it from 1 to 10.",
            match mode {
                Mode::Concise => "Keep the explanation to one or two sentences.",
                Mode::Detailed => "Write an explanation of at least three sentences covering the main features.",
                Mode::Comprehensive => "Write an extensive, multi-paragraph explanation covering every notable aspect.",
            },
            OUTPUT_CONTRACT_EN,
        ),
        Language::Chinese => (
            "你是一个直率又幽默的评委。查看附带的图片，判断对象是 Smash 还是 Pass，并给出1到10的评分。",
            match mode {
                Mode::Concise => "解释控制在一到两句话。",
                Mode::Detailed => "解释至少三句话，覆盖主要特征。",
                Mode::Comprehensive => "写一段多段落的详尽解释，覆盖所有值得注意的方面。",
            },
            OUTPUT_CONTRACT_ZH,
        ),
    };
    format!("{role} {length} {contract}")
}

fn bands(labels: [&str; 5]) -> Vec<RatingBand> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let min = (i as u8) * 2 + 1;
            RatingBand {
                min,
                max: min + 1,
                label: label.to_string(),
            }
        })
        .collect()
}

fn titles(concise: &str, detailed: &str, comprehensive: &str) -> BTreeMap<Mode, String> {
    BTreeMap::from([
        (Mode::Concise, concise.to_string()),
        (Mode::Detailed, detailed.to_string()),
        (Mode::Comprehensive, comprehensive.to_string()),
    ])
}

fn english() -> LabelSet {
    LabelSet {
        title: "Smash or Pass AI".into(),
        subtitle: "Upload an image to get an AI-powered analysis.".into(),
        analyze_button: "Analyze".into(),
        analyzing_button: "Analyzing...".into(),
        loading_text: "Analyzing... This may take a moment.".into(),
        error_prefix: "Analysis Failed:".into(),
        api_key_invalid_error:
            "The provided API key is not valid. Please check your key and try again.".into(),
        model_error: "The model did not return a response. This may be due to a safety policy \
                      violation or an unknown API error."
            .into(),
        prompt_error: "System prompt for mode \"{mode}\" not found.".into(),
        api_key_missing_error: "Please provide your API key.".into(),
        verdict_label: "Verdict:".into(),
        score_label: "Score:".into(),
        explanation_label: "Explanation:".into(),
        mode_titles: titles("Concise", "Detailed", "Comprehensive"),
        rating_bands: bands(["Hard pass", "Not really", "Decent", "Hot", "Stunning"]),
    }
}

fn chinese() -> LabelSet {
    LabelSet {
        title: "上不上AI评分系统".into(),
        subtitle: "上传图片，让AI来评判。".into(),
        analyze_button: "分析".into(),
        analyzing_button: "分析中...".into(),
        loading_text: "分析中... 这可能需要一些时间。".into(),
        error_prefix: "分析失败:".into(),
        api_key_invalid_error: "提供的API密钥无效。请检查您的密钥后重试。".into(),
        model_error: "模型未返回响应。这可能是由于安全策略违规或未知的API错误。".into(),
        prompt_error: "未找到“{mode}”模式的系统提示。".into(),
        api_key_missing_error: "请输入您的API密钥。".into(),
        verdict_label: "评定:".into(),
        score_label: "分数:".into(),
        explanation_label: "解释:".into(),
        mode_titles: titles("简洁", "详细", "全面"),
        rating_bands: bands(["完全不行", "勉强", "还可以", "挺好", "绝了"]),
    }
}

pub(super) fn catalog() -> Catalog {
    let instructions = Language::ALL
        .into_iter()
        .map(|language| {
            let modes = Mode::ALL
                .into_iter()
                .map(|mode| (mode, instruction(mode, language)))
                .collect();
            (language, modes)
        })
        .collect();

    let labels = BTreeMap::from([
        (Language::English, english()),
        (Language::Chinese, chinese()),
    ]);

    Catalog {
        instructions,
        labels,
    }
}
