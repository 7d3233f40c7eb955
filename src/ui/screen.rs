/// 页面上一个可寻址元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub data_test: String,
    pub text: String,
    pub visible: bool,
    pub value: Option<String>,
}

impl Element {
    pub fn new(data_test: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            data_test: data_test.into(),
            text: text.into(),
            visible: true,
            value: None,
        }
    }

    /// 输入框，文本为当前值
    pub fn input(data_test: impl Into<String>, value: &str) -> Self {
        Self {
            data_test: data_test.into(),
            text: String::new(),
            visible: true,
            value: Some(value.to_string()),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// 一次渲染的结果
#[derive(Debug, Clone, Default)]
pub struct Screen {
    pub route: String,
    elements: Vec<Element>,
}

impl Screen {
    pub fn new(route: &str) -> Self {
        Self {
            route: route.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn extend(&mut self, elements: impl IntoIterator<Item = Element>) {
        self.elements.extend(elements);
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// 按 data-test 选择，保持文档顺序
    pub fn select(&self, data_test: &str) -> Vec<&Element> {
        self.elements
            .iter()
            .filter(|element| element.data_test == data_test)
            .collect()
    }

    pub fn exists(&self, data_test: &str) -> bool {
        self.elements.iter().any(|element| element.data_test == data_test)
    }

    /// 任一可见元素的文本包含 `text`
    pub fn contains(&self, text: &str) -> bool {
        self.elements
            .iter()
            .any(|element| element.visible && element.text.contains(text))
    }
}
