use serde::Serialize;

/// 속성 값의 타입
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Object(Vec<Attribute>),
}

/// 호스트 프레임워크에 공개하는 속성 선언
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AttributeType,
    pub required: bool,
    pub computed: bool,
    /// 값이 바뀌면 리소스를 새로 만들어야 함
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Attribute {
    fn new(name: &str, ty: AttributeType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: false,
            computed: false,
            force_new: false,
            description: None,
        }
    }

    pub fn required(name: &str, ty: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::new(name, ty)
        }
    }

    pub fn optional(name: &str, ty: AttributeType) -> Self {
        Self::new(name, ty)
    }

    pub fn computed(name: &str, ty: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::new(name, ty)
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn list_of(ty: AttributeType) -> AttributeType {
        AttributeType::List(Box::new(ty))
    }
}

/// 리소스 타입 하나의 스키마
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSchema {
    pub type_name: String,
    pub attributes: Vec<Attribute>,
}

impl ResourceSchema {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
