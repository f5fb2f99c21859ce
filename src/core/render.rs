use crate::core::area::AreaCheck;
use crate::core::distance::format_distance;
use crate::models::messages::{Bubble, FlexComponent, FlexContainer, Template};
use crate::models::{Action, Category, Message, PriceRange, RankedRestaurant, UserSession, PRICE_UNBOUNDED};
use serde::Deserialize;

const SHARE_LOCATION_LABEL: &str = "傳送位置";
const LOCATION_PROMPT: &str = "請直接傳送你的位置資訊，我們會根據你的位置推薦附近的餐廳！ 🍽️";
const NOT_FOUND_TEXT: &str = "抱歉，在您附近沒有找到合適的餐廳。請嘗試其他位置或使用其他搜尋方式。";
const POPULAR_TEXT: &str = "以下是熱門推薦餐廳：\n1. 餐廳A\n2. 餐廳B\n3. 餐廳C";
const PRICE_FORMAT_HINT: &str = "格式範例：\n• 100-500（100 到 500 元）\n• 100~（100 元以上）\n• ~500（500 元以下）\n• 300（300 元左右）";

/// Preset budgets offered by the price menu: (label, min, max)
pub const PRICE_PRESETS: [(&str, u32, u32); 3] = [
    ("200 元以下", 0, 200),
    ("200-500 元", 200, 500),
    ("500 元以上", 500, PRICE_UNBOUNDED),
];

/// Which three search dimensions the main menu offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuVariant {
    #[default]
    AreaTypePopular,
    PriceTypeArea,
}

/// Image and link settings for result cards
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub menu_keyword: String,
    pub menu_variant: MenuVariant,
    pub photo_base_url: String,
    pub photo_api_key: String,
    pub photo_max_width: u32,
    pub placeholder_image_url: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            menu_keyword: "選單".to_string(),
            menu_variant: MenuVariant::default(),
            photo_base_url: "https://maps.googleapis.com".to_string(),
            photo_api_key: String::new(),
            photo_max_width: 600,
            placeholder_image_url: "https://via.placeholder.com/600x400?text=No+Image".to_string(),
        }
    }
}

/// Builds every outbound payload the bot sends
#[derive(Debug, Clone, Default)]
pub struct ReplyRenderer {
    options: RenderOptions,
}

impl ReplyRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn main_menu(&self) -> Message {
        let actions = match self.options.menu_variant {
            MenuVariant::AreaTypePopular => vec![
                Action::postback("依地區", "action=search&by=area"),
                Action::postback("依類型", "action=search&by=type"),
                Action::postback("熱門推薦", "action=search&by=popular"),
            ],
            MenuVariant::PriceTypeArea => vec![
                Action::postback("依價格", "action=search&by=price"),
                Action::postback("依類型", "action=search&by=type"),
                Action::postback("依距離", "action=search&by=area"),
            ],
        };

        Message::Template {
            alt_text: "請選擇搜尋條件".to_string(),
            template: Template::Buttons {
                title: "請選擇搜尋條件".to_string(),
                text: "您可以根據以下條件搜尋餐廳：".to_string(),
                actions,
            },
        }
    }

    pub fn help(&self) -> Message {
        Message::text(format!("您好！請輸入「{}」來查看可用的選項。", self.options.menu_keyword))
    }

    pub fn area_prompt(&self) -> Message {
        Message::text("請輸入您想搜尋的地區（例如：台北市 中山區）")
    }

    pub fn location_request(&self) -> Message {
        Message::text_with_actions(LOCATION_PROMPT, vec![Action::location(SHARE_LOCATION_LABEL)])
    }

    pub fn area_result(&self, check: &AreaCheck) -> Message {
        if check.found {
            Message::text_with_actions(
                format!("{}\n請傳送您的位置，我們會推薦附近的餐廳。", check.message()),
                vec![Action::location(SHARE_LOCATION_LABEL)],
            )
        } else {
            Message::text(check.message())
        }
    }

    pub fn type_menu(&self) -> Message {
        let mut actions: Vec<Action> = Category::PRESETS
            .iter()
            .map(|category| {
                let keyword = category.default_keyword();
                Action::postback(
                    keyword,
                    format!(
                        "action=set_type&type={}&keyword={}",
                        category.as_str(),
                        urlencoding::encode(keyword)
                    ),
                )
            })
            .collect();
        actions.push(Action::postback("自訂類型", "action=custom_type"));

        Message::text_with_actions("請選擇想吃的餐廳類型：", actions)
    }

    pub fn custom_type_prompt(&self) -> Message {
        Message::text("請輸入您想搜尋的餐廳類型（例如：火鍋、壽司、義大利麵）")
    }

    pub fn price_menu(&self) -> Message {
        let mut actions: Vec<Action> = PRICE_PRESETS
            .iter()
            .map(|(label, min, max)| {
                Action::postback(*label, format!("action=set_price&min={}&max={}", min, max))
            })
            .collect();
        actions.push(Action::postback("自訂價格", "action=custom_price"));

        Message::Template {
            alt_text: "請選擇價格範圍".to_string(),
            template: Template::Buttons {
                title: "請選擇價格範圍".to_string(),
                text: "每人預算大約是多少？".to_string(),
                actions,
            },
        }
    }

    pub fn price_prompt(&self) -> Message {
        Message::text(format!("請輸入您的預算（每人，新台幣）。\n{}", PRICE_FORMAT_HINT))
    }

    pub fn invalid_price(&self) -> Message {
        Message::text(format!("無法辨識您輸入的價格，請再試一次。\n{}", PRICE_FORMAT_HINT))
    }

    pub fn popular(&self) -> Message {
        Message::text(POPULAR_TEXT)
    }

    /// Summarize accumulated filters and ask for the user's location
    pub fn confirmation(&self, session: &UserSession) -> Message {
        if !session.has_filters() {
            return self.location_request();
        }

        let mut lines = vec!["目前的搜尋條件：".to_string()];
        if let Some(price) = &session.price_range {
            lines.push(format!("• 價格：{}", price));
        }
        if let Some(kind) = &session.restaurant_type {
            lines.push(format!("• 類型：{}", kind.keyword));
        }
        lines.push("請傳送您的位置，我們將為您搜尋附近的餐廳！".to_string());

        Message::text_with_actions(lines.join("\n"), vec![Action::location(SHARE_LOCATION_LABEL)])
    }

    pub fn not_found(&self) -> Message {
        Message::text(NOT_FOUND_TEXT)
    }

    /// Carousel of ranked results, or the not-found text when empty
    pub fn restaurants(&self, results: &[RankedRestaurant], budget: Option<&PriceRange>) -> Message {
        if results.is_empty() {
            return self.not_found();
        }

        let bubbles = results
            .iter()
            .map(|r| FlexContainer::Bubble(self.restaurant_bubble(r, budget)))
            .collect();

        Message::Flex {
            alt_text: "附近推薦餐廳".to_string(),
            contents: FlexContainer::Carousel { contents: bubbles },
        }
    }

    fn restaurant_bubble(&self, result: &RankedRestaurant, budget: Option<&PriceRange>) -> Bubble {
        let place = &result.place;

        let rating = match (place.rating, place.rating_count) {
            (Some(rating), Some(count)) => format!("評分：{:.1}（{} 則評論）", rating, count),
            (Some(rating), None) => format!("評分：{:.1}", rating),
            _ => "評分：N/A".to_string(),
        };

        let mut body = vec![
            text_component(&place.name, true, Some("bold"), Some("md")),
            text_component(&rating, false, None, Some("sm")),
        ];
        if let Some(price) = price_annotation(place.price_level, budget) {
            body.push(text_component(&price, false, None, Some("sm")));
        }
        body.push(text_component(
            &format!("距離：{}", format_distance(result.distance_m)),
            false,
            None,
            Some("sm"),
        ));
        body.push(text_component(
            &format!("地址：{}", place.address.as_deref().unwrap_or("未知")),
            true,
            None,
            Some("sm"),
        ));

        Bubble {
            hero: FlexComponent::Image {
                url: self.photo_url(place.photo_reference.as_deref()),
                size: "full".to_string(),
                aspect_ratio: "20:13".to_string(),
                aspect_mode: "cover".to_string(),
            },
            body: FlexComponent::Box {
                layout: "vertical".to_string(),
                spacing: Some("sm".to_string()),
                contents: body,
                flex: None,
            },
            footer: FlexComponent::Box {
                layout: "horizontal".to_string(),
                spacing: None,
                contents: vec![FlexComponent::Button {
                    style: "link".to_string(),
                    height: "sm".to_string(),
                    action: Action::Uri {
                        label: "查看地圖".to_string(),
                        uri: map_url(&place.name, place.address.as_deref()),
                    },
                }],
                flex: Some(0),
            },
        }
    }

    fn photo_url(&self, photo_reference: Option<&str>) -> String {
        match photo_reference {
            Some(reference) => format!(
                "{}/maps/api/place/photo?maxwidth={}&photoreference={}&key={}",
                self.options.photo_base_url.trim_end_matches('/'),
                self.options.photo_max_width,
                urlencoding::encode(reference),
                urlencoding::encode(&self.options.photo_api_key),
            ),
            None => self.options.placeholder_image_url.clone(),
        }
    }
}

fn text_component(text: &str, wrap: bool, weight: Option<&str>, size: Option<&str>) -> FlexComponent {
    FlexComponent::Text {
        text: text.to_string(),
        wrap,
        weight: weight.map(str::to_string),
        size: size.map(str::to_string),
        color: None,
    }
}

/// Search link for a place on the map
pub fn map_url(name: &str, address: Option<&str>) -> String {
    let query = match address {
        Some(address) => format!("{} {}", name, address),
        None => name.to_string(),
    };
    format!("https://maps.google.com/?q={}", urlencoding::encode(&query))
}

/// `價位：$$（符合預算）`; only shown when the place reports a price level
pub fn price_annotation(price_level: Option<u8>, budget: Option<&PriceRange>) -> Option<String> {
    let level = price_level?;
    let symbols = if level == 0 { "免費".to_string() } else { "$".repeat(level as usize) };

    Some(match budget {
        Some(budget) if budget.price_levels().contains(&level) => format!("價位：{}（符合預算）", symbols),
        Some(_) => format!("價位：{}（可能不符預算）", symbols),
        None => format!("價位：{}", symbols),
    })
}
