use lettre::Address;
use lettre::message::Mailbox;
use serde::Serialize;

use crate::errors::Result;
use crate::storage::{Campaign, CampaignContent};

/// 一封待发送的邮件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// "Name <email>"
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// 为单个收件人构建邮件
///
/// 正文中的 `placeholder` 全部替换为收件人 ID，使追踪链接能识别点击者。
pub fn build_message(
    campaign: &Campaign,
    content: &CampaignContent,
    to: &str,
    recipient_id: &str,
    placeholder: &str,
) -> Result<OutboundMessage> {
    let address: Address = campaign.from_email.trim().parse()?;
    let name = campaign.from_name.trim();
    let from = Mailbox::new((!name.is_empty()).then(|| name.to_string()), address).to_string();

    let html_body = content.html.replace(placeholder, recipient_id);
    let text_body = if content.text.trim().is_empty() {
        html_to_text(&html_body)
    } else {
        content.text.replace(placeholder, recipient_id)
    };

    let reply_to = Some(campaign.reply_to.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    Ok(OutboundMessage {
        from,
        to: to.to_string(),
        reply_to,
        subject: campaign.subject_line.clone(),
        text_body,
        html_body,
    })
}

/// 去掉 HTML 标签，生成纯文本备用正文
///
/// 仅在活动没有存储纯文本正文时使用。`style`/`script` 内容被丢弃，
/// 块级标签换行；实体只解码常见的命名实体和全部数字实体（`&#8217;`、`&#x2019;`），
/// 其余命名实体原样保留。
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag = String::new();
    let mut skip_until: Option<&'static str> = None;

    for ch in html.chars() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                let closing = tag.starts_with('/');

                match (skip_until, closing, name.as_str()) {
                    (Some(end), true, n) if n == end => skip_until = None,
                    (Some(_), _, _) => {}
                    (None, false, "style") => skip_until = Some("style"),
                    (None, false, "script") => skip_until = Some("script"),
                    (None, _, "br" | "p" | "div" | "tr" | "li" | "h1" | "h2" | "h3") => {
                        out.push('\n')
                    }
                    _ => {}
                }
                tag.clear();
            } else {
                tag.push(ch);
            }
        } else if ch == '<' {
            in_tag = true;
        } else if skip_until.is_none() {
            out.push(ch);
        }
    }

    let decoded = decode_entities(&out);

    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        // 12 字节内没有分号就按普通文本处理
        let decoded = rest
            .bytes()
            .take(12)
            .position(|b| b == b';')
            .and_then(|end| decode_entity(&rest[1..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
